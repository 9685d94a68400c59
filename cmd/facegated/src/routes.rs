//! HTTP surface.
//!
//! - `POST /encode`    one photo → transport-encoded descriptor (internal)
//! - `POST /enroll`    photos → averaged descriptor in an encrypted envelope (internal)
//! - `POST /recognize` probe photo + zone or explicit candidates → MatchResult
//! - `POST /compare`   probe photo + two envelopes → calibration report (internal)
//! - `GET  /health`    liveness + sync observability

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;

use facegate_descriptor::{encode_transport, open, seal, DescriptorError, Envelope};
use facegate_faceprint::{enroll_descriptor, FaceEmbedder, FaceprintError};
use facegate_matcher::{compare_pair, MatchResult, Matcher, PairComparison};
use facegate_roster::{Enrollment, Roster};
use facegate_syncer::SyncAgent;

use crate::auth;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub roster: Arc<Roster>,
    pub matcher: Arc<Matcher>,
    pub embedder: Arc<dyn FaceEmbedder>,
    pub agent: Arc<SyncAgent>,
}

pub fn router(state: AppState) -> Router {
    let guarded = Router::new()
        .route("/encode", post(encode))
        .route("/enroll", post(enroll))
        .route("/compare", post(compare))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/recognize", post(recognize))
        .merge(guarded)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Per-request error surface. Sync failures never show up here; a probe
/// that matches nothing is a normal MatchResult, not an error.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Face(FaceprintError),
    Descriptor(DescriptorError),
}

impl From<FaceprintError> for ApiError {
    fn from(e: FaceprintError) -> Self {
        Self::Face(e)
    }
}

impl From<DescriptorError> for ApiError {
    fn from(e: DescriptorError) -> Self {
        Self::Descriptor(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, detail) = match self {
            Self::Validation(detail) => (StatusCode::BAD_REQUEST, "validation", detail),
            Self::Face(FaceprintError::NoFaceDetected) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "no_face_detected",
                "no face detected in the photo".to_string(),
            ),
            Self::Face(FaceprintError::MultipleFacesDetected) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "multiple_faces_detected",
                "more than one face detected in the photo".to_string(),
            ),
            Self::Face(FaceprintError::EmptyInput) => (
                StatusCode::BAD_REQUEST,
                "validation",
                "empty photo".to_string(),
            ),
            Self::Face(e) => (StatusCode::BAD_GATEWAY, "embedding_service", e.to_string()),
            Self::Descriptor(DescriptorError::Authentication) => (
                StatusCode::BAD_REQUEST,
                "authentication",
                "envelope authentication failed".to_string(),
            ),
            Self::Descriptor(e) => (StatusCode::BAD_REQUEST, "decode", e.to_string()),
        };
        (status, Json(json!({"error": error, "detail": detail}))).into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    enrolled: usize,
    syncing: bool,
    completed_cycles: u64,
    failed_cycles: u64,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        enrolled: state.roster.len(),
        syncing: state.agent.is_refreshing(),
        completed_cycles: state.agent.completed_cycles(),
        failed_cycles: state.agent.failed_cycles(),
    })
}

#[derive(Serialize)]
struct EncodeResponse {
    embedding: String,
}

async fn encode(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<EncodeResponse>, ApiError> {
    let parts = RequestParts::read(multipart).await?;
    let photo = parts.single_photo()?;

    let descriptor = state.embedder.embed(&photo).await?;
    Ok(Json(EncodeResponse {
        embedding: encode_transport(&descriptor),
    }))
}

#[derive(Serialize)]
struct EnrollResponse {
    #[serde(flatten)]
    envelope: Envelope,
    photos_processed: usize,
}

async fn enroll(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<EnrollResponse>, ApiError> {
    let parts = RequestParts::read(multipart).await?;
    if parts.photos.is_empty() {
        return Err(ApiError::Validation("at least one image part is required".to_string()));
    }

    let enrolled = enroll_descriptor(state.embedder.as_ref(), &parts.photos).await?;
    let envelope = seal(&enrolled.descriptor, &state.config.descriptor_key)?;
    Ok(Json(EnrollResponse {
        envelope,
        photos_processed: enrolled.photos_processed,
    }))
}

/// One entry of an explicit candidate list.
#[derive(Debug, Deserialize)]
struct CandidateEntry {
    id: String,
    envelope: Envelope,
}

async fn recognize(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<MatchResult>, ApiError> {
    let parts = RequestParts::read(multipart).await?;
    let photo = parts.single_photo()?;

    // An explicit candidate list is the narrower scope and wins over zone.
    enum Scope {
        Candidates(String),
        Zone(String),
    }
    let scope = match (parts.candidates, parts.zone) {
        (Some(text), _) => Scope::Candidates(text),
        (None, Some(zone)) => Scope::Zone(zone),
        (None, None) => {
            return Err(ApiError::Validation(
                "either zone or candidates is required".to_string(),
            ));
        }
    };

    let probe = state.embedder.embed(&photo).await?;
    let threshold = state.config.match_threshold;

    let result = match scope {
        Scope::Candidates(text) => {
            let entries: Vec<CandidateEntry> = serde_json::from_str(&text)
                .map_err(|e| ApiError::Validation(format!("invalid candidates: {e}")))?;

            let mut candidates = Vec::with_capacity(entries.len());
            for entry in entries {
                let descriptor = open(
                    &entry.envelope,
                    &state.config.descriptor_key,
                    state.config.descriptor_dim,
                )?;
                candidates.push(Enrollment {
                    id: entry.id,
                    descriptor,
                    zones: Vec::new(),
                });
            }
            state.matcher.recognize_among(&probe, &candidates, threshold)
        }
        Scope::Zone(zone) => state.matcher.recognize_in_zone(&probe, &zone, threshold),
    };

    Ok(Json(result))
}

async fn compare(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PairComparison>, ApiError> {
    let parts = RequestParts::read(multipart).await?;
    let photo = parts.single_photo()?;

    let envelope_a = parts.envelope("envelope_a")?;
    let envelope_b = parts.envelope("envelope_b")?;

    let probe = state.embedder.embed(&photo).await?;
    let report = compare_pair(
        &probe,
        &envelope_a,
        &envelope_b,
        &state.config.descriptor_key,
        state.config.descriptor_dim,
    )?;
    Ok(Json(report))
}

/// Collected multipart fields. Unknown parts are ignored.
#[derive(Default)]
struct RequestParts {
    photos: Vec<Vec<u8>>,
    zone: Option<String>,
    candidates: Option<String>,
    envelopes: Vec<(String, String)>,
}

impl RequestParts {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut parts = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::Validation(e.to_string()))?;
                    parts.photos.push(bytes.to_vec());
                }
                "zone" => {
                    parts.zone = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| ApiError::Validation(e.to_string()))?,
                    );
                }
                "candidates" => {
                    parts.candidates = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| ApiError::Validation(e.to_string()))?,
                    );
                }
                "envelope_a" | "envelope_b" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::Validation(e.to_string()))?;
                    parts.envelopes.push((name, text));
                }
                _ => {}
            }
        }
        Ok(parts)
    }

    fn single_photo(&self) -> Result<Vec<u8>, ApiError> {
        match self.photos.as_slice() {
            [photo] => Ok(photo.clone()),
            [] => Err(ApiError::Validation("missing image part".to_string())),
            _ => Err(ApiError::Validation("exactly one image part is required".to_string())),
        }
    }

    fn envelope(&self, name: &str) -> Result<Envelope, ApiError> {
        let text = self
            .envelopes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
            .ok_or_else(|| ApiError::Validation(format!("missing {name} part")))?;
        serde_json::from_str(text)
            .map_err(|e| ApiError::Validation(format!("invalid {name}: {e}")))
    }
}
