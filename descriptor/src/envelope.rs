use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use serde::{Deserialize, Serialize};

use crate::codec::{descriptor_from_bytes, descriptor_to_bytes};
use crate::error::DescriptorError;

/// AES-256-GCM key length in bytes.
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// A descriptor sealed under AES-256-GCM.
///
/// The nonce is generated fresh for every [`seal`] call and travels with the
/// ciphertext; it is not secret, but it must never be reused under the same
/// key. Wire shape: `{"embedding": <base64>, "nonce": <base64>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "embedding", with = "b64")]
    pub ciphertext: Vec<u8>,

    #[serde(with = "b64")]
    pub nonce: Vec<u8>,
}

/// Encrypts a descriptor under `key` with a freshly generated nonce.
pub fn seal(descriptor: &[f32], key: &[u8; KEY_LEN]) -> Result<Envelope, DescriptorError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, descriptor_to_bytes(descriptor).as_slice())
        .map_err(|_| DescriptorError::Encryption)?;
    Ok(Envelope {
        ciphertext,
        nonce: nonce.to_vec(),
    })
}

/// Decrypts an envelope and decodes the descriptor, checking it has `dim`
/// components. A tampered ciphertext, wrong nonce, or wrong key fails with
/// [`DescriptorError::Authentication`].
pub fn open(
    envelope: &Envelope,
    key: &[u8; KEY_LEN],
    dim: usize,
) -> Result<Vec<f32>, DescriptorError> {
    if envelope.nonce.len() != NONCE_LEN {
        return Err(DescriptorError::BadNonce {
            expected: NONCE_LEN,
            got: envelope.nonce.len(),
        });
    }
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(&envelope.nonce);
    let plaintext = cipher
        .decrypt(nonce, envelope.ciphertext.as_slice())
        .map_err(|_| DescriptorError::Authentication)?;
    descriptor_from_bytes(&plaintext, dim)
}

mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(&text).map_err(serde::de::Error::custom)
    }
}
