//! Facial descriptor codec: transport encoding and encrypted envelopes.
//!
//! A descriptor is a fixed-length `f32` vector produced by an external face
//! embedding model. Two representations leave the process boundary:
//!
//! - **Transport encoding**: raw little-endian `f32` bytes, standard base64.
//!   Used for the trusted upstream catalog.
//! - **Envelope**: the same bytes sealed with AES-256-GCM plus a fresh
//!   per-call nonce. Used whenever a descriptor is stored or echoed outside
//!   the trusted boundary.
//!
//! ```
//! use facegate_descriptor::{decode_transport, encode_transport};
//!
//! let descriptor = vec![0.25f32; 128];
//! let text = encode_transport(&descriptor);
//! let back = decode_transport(&text, 128).unwrap();
//! assert_eq!(descriptor, back);
//! ```

mod codec;
mod envelope;
mod error;

pub use codec::{decode_transport, descriptor_from_bytes, descriptor_to_bytes, encode_transport};
pub use envelope::{open, seal, Envelope, KEY_LEN, NONCE_LEN};
pub use error::DescriptorError;
