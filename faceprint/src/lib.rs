//! Face embedding boundary.
//!
//! The embedding model itself (photo → descriptor) is an external
//! collaborator behind the [`FaceEmbedder`] trait; this crate supplies the
//! reqwest-backed remote implementation and the enrollment helper that
//! turns several photos of one person into a single descriptor.

mod embedder;
mod enroll;
mod error;
mod remote;

pub use embedder::FaceEmbedder;
pub use enroll::{average_descriptors, enroll_descriptor, EnrolledDescriptor};
pub use error::FaceprintError;
pub use remote::RemoteEmbedder;
