use thiserror::Error;

/// Errors returned by face embedding and enrollment operations.
#[derive(Debug, Error)]
pub enum FaceprintError {
    #[error("faceprint: no face detected in the photo")]
    NoFaceDetected,

    #[error("faceprint: more than one face detected in the photo")]
    MultipleFacesDetected,

    #[error("faceprint: empty input")]
    EmptyInput,

    #[error("faceprint: embedding service error: {0}")]
    Service(String),

    #[error("faceprint: unexpected descriptor dimension: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}
