//! Shared-key authentication for the internal routes.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::routes::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects requests whose `x-api-key` header does not match the configured
/// service key. Applied to /encode, /enroll and /compare; /recognize stays
/// open for kiosk devices.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if presented != Some(state.config.api_key.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "unauthorized", "detail": "invalid API key"})),
        )
            .into_response();
    }

    next.run(request).await
}
