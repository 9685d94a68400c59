use thiserror::Error;

/// Errors from one sync cycle. All of them are transient: the agent logs
/// the failure and retries on the next timer tick, never immediately.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync: upstream request failed: {0}")]
    Upstream(String),

    #[error("sync: upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("sync: malformed catalog payload: {0}")]
    Payload(String),
}
