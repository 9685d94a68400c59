use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::DescriptorError;

/// Serializes a descriptor as raw little-endian f32 bytes in vector order.
pub fn descriptor_to_bytes(descriptor: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(descriptor.len() * 4);
    for v in descriptor {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Inverse of [`descriptor_to_bytes`]. Fails if the byte length is not a
/// multiple of 4 or the decoded vector does not have `dim` components.
pub fn descriptor_from_bytes(bytes: &[u8], dim: usize) -> Result<Vec<f32>, DescriptorError> {
    if bytes.len() % 4 != 0 {
        return Err(DescriptorError::Misaligned(bytes.len()));
    }
    let got = bytes.len() / 4;
    if got != dim {
        return Err(DescriptorError::DimensionMismatch { expected: dim, got });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Encodes a descriptor for JSON transport: little-endian f32 bytes,
/// standard base64.
pub fn encode_transport(descriptor: &[f32]) -> String {
    STANDARD.encode(descriptor_to_bytes(descriptor))
}

/// Decodes a transport-encoded descriptor, checking it has `dim` components.
pub fn decode_transport(text: &str, dim: usize) -> Result<Vec<f32>, DescriptorError> {
    let bytes = STANDARD.decode(text)?;
    descriptor_from_bytes(&bytes, dim)
}
