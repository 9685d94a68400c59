use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::error::SyncError;

/// Upstream fetch timeout. A hung fetch counts as a failed cycle.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One catalog entry as served by the upstream source of truth.
///
/// The upstream is trusted/internal, so descriptors arrive in plain
/// transport encoding, not envelopes. `descriptor` may be absent for
/// identities enrolled without a face on file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRecord {
    pub id: String,

    #[serde(default)]
    pub descriptor: Option<String>,

    #[serde(default)]
    pub zones: Vec<String>,
}

#[derive(Deserialize)]
struct CatalogPayload {
    data: Vec<CatalogRecord>,
}

/// CatalogClient fetches the complete enrollment catalog — every currently
/// enrolled identity in one response, not a delta.
///
/// Implementations must be safe for concurrent use (Send + Sync).
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogRecord>, SyncError>;
}

/// HTTP catalog client for the main API.
///
/// Protocol: `GET {base_url}/enrollments/faces` with the shared service key
/// in `x-api-key`; response body is `{"data": [CatalogRecord, ...]}`.
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Upstream(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogRecord>, SyncError> {
        let url = format!("{}/enrollments/faces", self.base_url);

        let resp = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| SyncError::Upstream(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: CatalogPayload = resp
            .json()
            .await
            .map_err(|e| SyncError::Payload(e.to_string()))?;
        Ok(payload.data)
    }
}
