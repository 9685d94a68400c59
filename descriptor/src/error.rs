use thiserror::Error;

/// Errors returned by descriptor codec and envelope operations.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("descriptor: invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("descriptor: byte length {0} is not a multiple of 4")]
    Misaligned(usize),

    #[error("descriptor: dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("descriptor: nonce must be {expected} bytes, got {got}")]
    BadNonce { expected: usize, got: usize },

    #[error("descriptor: envelope authentication failed")]
    Authentication,

    #[error("descriptor: encryption failed")]
    Encryption,
}

impl DescriptorError {
    /// True for structurally malformed input (as opposed to a failed
    /// authentication check on well-formed input).
    pub fn is_decode(&self) -> bool {
        !matches!(self, Self::Authentication | Self::Encryption)
    }
}
