use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::embedder::FaceEmbedder;
use crate::error::FaceprintError;

const DEFAULT_DIM: usize = 128;

/// Successful embedding service response.
#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Error body returned by the embedding service on 4xx responses.
#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Face embedder backed by a remote embedding service.
///
/// Protocol: `POST {base_url}/embeddings` with a multipart `image` part;
/// `200` returns `{"embedding": [f32, ...]}`, `422` returns
/// `{"error": "no_face_detected" | "multiple_faces_detected"}`.
pub struct RemoteEmbedder {
    client: Client,
    base_url: String,
    dim: usize,
}

impl RemoteEmbedder {
    pub fn new(base_url: &str) -> Self {
        Self::with_dimension(base_url, DEFAULT_DIM)
    }

    pub fn with_dimension(base_url: &str, dim: usize) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            dim,
        }
    }
}

#[async_trait::async_trait]
impl FaceEmbedder for RemoteEmbedder {
    async fn embed(&self, photo: &[u8]) -> Result<Vec<f32>, FaceprintError> {
        if photo.is_empty() {
            return Err(FaceprintError::EmptyInput);
        }

        let url = format!("{}/embeddings", self.base_url);
        let form = Form::new().part("image", Part::bytes(photo.to_vec()).file_name("photo.jpg"));

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| FaceprintError::Service(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let body: ErrorResponse = resp
                .json()
                .await
                .map_err(|e| FaceprintError::Service(e.to_string()))?;
            return Err(match body.error.as_str() {
                "no_face_detected" => FaceprintError::NoFaceDetected,
                "multiple_faces_detected" => FaceprintError::MultipleFacesDetected,
                other => FaceprintError::Service(other.to_string()),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FaceprintError::Service(format!("HTTP {status}: {body}")));
        }

        let body: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| FaceprintError::Service(e.to_string()))?;

        if body.embedding.len() != self.dim {
            return Err(FaceprintError::DimensionMismatch {
                expected: self.dim,
                got: body.embedding.len(),
            });
        }
        Ok(body.embedding)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
