//! Authenticated Encryption with Associated Data
//!
//! Uses AES-256-GCM (96-bit nonce).
//! Key size: 32 bytes.  Nonce: 12 bytes (random).  Tag: 16 bytes.
//!
//! Unlike a framed format, the nonce is NOT prepended here: the conversation
//! container carries it as its own field (`iv`), so these helpers take and
//! return the pieces separately.
//!
//! Ciphertext layout:
//!   [ ciphertext | tag (16 bytes) ]

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::kdf::ConversationKey;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Generate a fresh random 12-byte nonce. Must never repeat under one key.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Encrypt `plaintext`, returning ciphertext with the tag appended.
/// `aad`: additional associated data (authenticated but not encrypted).
pub fn encrypt(
    key: &ConversationKey,
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::AeadEncrypt)?;

    cipher
        .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::AeadEncrypt)
}

/// Decrypt ciphertext+tag. Any mismatch (key, nonce, ciphertext, aad) fails
/// as a whole; no partial plaintext is ever produced.
pub fn decrypt(
    key: &ConversationKey,
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if ciphertext.len() < TAG_LEN {
        return Err(CryptoError::AeadDecrypt);
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::AeadDecrypt)?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
        .map_err(|_| CryptoError::AeadDecrypt)?;

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::{derive_key, KdfParams, SALT_LEN};

    fn key(passphrase: &[u8]) -> ConversationKey {
        derive_key(passphrase, &[0x5a; SALT_LEN], &KdfParams { iterations: 1 }).unwrap()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let k = key(b"k");
        let nonce = generate_nonce();
        let ct = encrypt(&k, &nonce, b"hello nidam", b"").unwrap();
        assert_eq!(ct.len(), b"hello nidam".len() + TAG_LEN);
        let pt = decrypt(&k, &nonce, &ct, b"").unwrap();
        assert_eq!(pt.as_slice(), b"hello nidam");
    }

    #[test]
    fn empty_plaintext_is_tag_only() {
        let k = key(b"k");
        let nonce = generate_nonce();
        let ct = encrypt(&k, &nonce, b"", b"").unwrap();
        assert_eq!(ct.len(), TAG_LEN);
        assert!(decrypt(&k, &nonce, &ct, b"").unwrap().is_empty());
    }

    #[test]
    fn wrong_key_fails() {
        let nonce = generate_nonce();
        let ct = encrypt(&key(b"a"), &nonce, b"secret", b"").unwrap();
        assert!(matches!(
            decrypt(&key(b"b"), &nonce, &ct, b""),
            Err(CryptoError::AeadDecrypt)
        ));
    }

    #[test]
    fn wrong_nonce_fails() {
        let k = key(b"k");
        let ct = encrypt(&k, &[1u8; NONCE_LEN], b"secret", b"").unwrap();
        assert!(decrypt(&k, &[2u8; NONCE_LEN], &ct, b"").is_err());
    }

    #[test]
    fn wrong_aad_fails() {
        let k = key(b"k");
        let nonce = generate_nonce();
        let ct = encrypt(&k, &nonce, b"secret", b"conversation").unwrap();
        assert!(decrypt(&k, &nonce, &ct, b"other").is_err());
    }

    #[test]
    fn tampered_tag_fails() {
        let k = key(b"k");
        let nonce = generate_nonce();
        let mut ct = encrypt(&k, &nonce, b"secret", b"").unwrap();
        if let Some(last) = ct.last_mut() {
            *last ^= 0x01;
        }
        assert!(decrypt(&k, &nonce, &ct, b"").is_err());
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let k = key(b"k");
        assert!(matches!(
            decrypt(&k, &[0u8; NONCE_LEN], &[0u8; TAG_LEN - 1], b""),
            Err(CryptoError::AeadDecrypt)
        ));
    }

    #[test]
    fn same_inputs_same_ciphertext() {
        let k = key(b"k");
        let nonce = [0x11; NONCE_LEN];
        assert_eq!(
            encrypt(&k, &nonce, b"abc", b"").unwrap(),
            encrypt(&k, &nonce, b"abc", b"").unwrap()
        );
    }

    #[test]
    fn generated_nonces_are_unique() {
        assert_ne!(generate_nonce(), generate_nonce());
    }
}
