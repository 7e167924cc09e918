//! Encrypted conversation container: what leaves the device.
//!
//! Anyone carrying the container (peer link, clipboard, disk) only sees:
//!   - id            (random UUID, no cryptographic meaning)
//!   - encryptedData (AES-256-GCM ciphertext + 16-byte tag, base64)
//!   - iv            (12-byte nonce, base64)
//!   - salt          (16-byte PBKDF2 salt, base64)
//!
//! The passphrase is never part of the container. The field names match the
//! exports written by the chat front end, so containers are interchangeable.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use nidam_crypto::aead::{NONCE_LEN, TAG_LEN};
use nidam_crypto::kdf::SALT_LEN;

use crate::error::ShareError;

/// On-wire container. Immutable once produced: build one with
/// [`crate::ConversationSealer::seal`] or [`EncryptedConversation::from_parts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedConversation {
    id: String,
    encrypted_data: String,
    iv: String,
    salt: String,
}

/// Decoded binary fields of a container, validated for length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerParts {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

impl ContainerParts {
    /// GCM tag length carried at the end of `ciphertext`.
    pub const TAG_LEN: usize = TAG_LEN;

    /// Length of the encrypted conversation without the tag.
    pub fn payload_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(TAG_LEN)
    }
}

impl EncryptedConversation {
    pub fn from_parts(id: impl Into<String>, salt: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Self {
        Self {
            id: id.into(),
            encrypted_data: STANDARD.encode(ciphertext),
            iv: STANDARD.encode(nonce),
            salt: STANDARD.encode(salt),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Base64 ciphertext + tag, as carried on the wire.
    pub fn encrypted_data(&self) -> &str {
        &self.encrypted_data
    }

    pub fn iv(&self) -> &str {
        &self.iv
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// Decode and validate the binary fields. Structural problems are
    /// `InvalidInput`; nothing here touches key material.
    pub fn parts(&self) -> Result<ContainerParts, ShareError> {
        if self.id.trim().is_empty() {
            return Err(ShareError::InvalidInput("container id is empty".into()));
        }
        let salt = decode_fixed::<SALT_LEN>("salt", &self.salt)?;
        let nonce = decode_fixed::<NONCE_LEN>("iv", &self.iv)?;
        let ciphertext = decode_field("encryptedData", &self.encrypted_data)?;
        if ciphertext.len() < TAG_LEN {
            return Err(ShareError::InvalidInput(format!(
                "encryptedData is {} bytes, shorter than the {TAG_LEN}-byte tag",
                ciphertext.len()
            )));
        }
        Ok(ContainerParts {
            salt,
            nonce,
            ciphertext,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ShareError> {
        serde_json::from_str(json)
            .map_err(|e| ShareError::InvalidInput(format!("malformed container: {e}")))
    }

    pub fn to_json(&self) -> Result<String, ShareError> {
        serde_json::to_string(self).map_err(|e| ShareError::Serialisation(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, ShareError> {
        serde_json::to_string_pretty(self).map_err(|e| ShareError::Serialisation(e.to_string()))
    }
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, ShareError> {
    STANDARD
        .decode(value)
        .map_err(|e| ShareError::InvalidInput(format!("{name} is not valid base64: {e}")))
}

fn decode_fixed<const N: usize>(name: &str, value: &str) -> Result<[u8; N], ShareError> {
    let bytes = decode_field(name, value)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
        ShareError::InvalidInput(format!("{name} must be {N} bytes, got {}", bytes.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EncryptedConversation {
        EncryptedConversation::from_parts(
            "5f0c7e4e-6b8e-4a53-9f57-0d7b8f1f2a10",
            &[1u8; SALT_LEN],
            &[2u8; NONCE_LEN],
            &[3u8; TAG_LEN + 4],
        )
    }

    #[test]
    fn wire_field_names() {
        let value: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["encryptedData", "id", "iv", "salt"]);
        assert_eq!(obj["iv"], "AgICAgICAgICAgIC");
    }

    #[test]
    fn parts_roundtrip() {
        let parts = sample().parts().unwrap();
        assert_eq!(parts.salt, [1u8; SALT_LEN]);
        assert_eq!(parts.nonce, [2u8; NONCE_LEN]);
        assert_eq!(parts.ciphertext, vec![3u8; TAG_LEN + 4]);
        assert_eq!(parts.payload_len(), 4);
    }

    #[test]
    fn missing_field_is_invalid_input() {
        let err = EncryptedConversation::from_json(r#"{"id":"x","iv":"AAAA","salt":"AAAA"}"#)
            .unwrap_err();
        assert!(matches!(err, ShareError::InvalidInput(_)));
    }

    #[test]
    fn bad_base64_is_invalid_input() {
        let c = EncryptedConversation {
            salt: "not base64!".into(),
            ..sample()
        };
        assert!(matches!(c.parts(), Err(ShareError::InvalidInput(_))));
    }

    #[test]
    fn wrong_nonce_length_is_invalid_input() {
        let c = EncryptedConversation::from_parts("id", &[0u8; SALT_LEN], &[0u8; 8], &[0u8; 32]);
        assert!(matches!(c.parts(), Err(ShareError::InvalidInput(_))));
    }

    #[test]
    fn wrong_salt_length_is_invalid_input() {
        let c = EncryptedConversation::from_parts("id", &[0u8; 32], &[0u8; NONCE_LEN], &[0u8; 32]);
        assert!(matches!(c.parts(), Err(ShareError::InvalidInput(_))));
    }

    #[test]
    fn ciphertext_shorter_than_tag_is_invalid_input() {
        let c = EncryptedConversation::from_parts(
            "id",
            &[0u8; SALT_LEN],
            &[0u8; NONCE_LEN],
            &[0u8; TAG_LEN - 1],
        );
        assert!(matches!(c.parts(), Err(ShareError::InvalidInput(_))));
    }

    #[test]
    fn empty_id_is_invalid_input() {
        let c = EncryptedConversation::from_parts("", &[0u8; SALT_LEN], &[0u8; NONCE_LEN], &[0u8; 32]);
        assert!(matches!(c.parts(), Err(ShareError::InvalidInput(_))));
    }
}
