use crate::error::FaceprintError;

/// FaceEmbedder converts a single-face photograph into a dense f32
/// descriptor.
///
/// Implementations must be safe for concurrent use (Send + Sync).
/// Descriptors from different implementations (or model versions) are not
/// comparable with each other.
#[async_trait::async_trait]
pub trait FaceEmbedder: Send + Sync {
    /// Return the descriptor for the face in `photo`.
    ///
    /// Fails with [`FaceprintError::NoFaceDetected`] or
    /// [`FaceprintError::MultipleFacesDetected`] when the photo does not
    /// contain exactly one face.
    async fn embed(&self, photo: &[u8]) -> Result<Vec<f32>, FaceprintError>;

    /// Return the dimensionality of the output descriptors.
    fn dimension(&self) -> usize;
}
