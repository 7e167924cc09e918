//! Key derivation functions
//!
//! `derive_key`: PBKDF2-HMAC-SHA256, turns a user passphrase plus a
//!   per-container random salt into the 32-byte AES-256-GCM key.
//!
//! Every offline guess against an exported conversation costs one full
//! PBKDF2 run at the configured iteration count.

use hmac::Hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

use crate::error::CryptoError;

/// Salt length in bytes (stored in the clear next to the ciphertext).
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Iteration count used by every exported conversation unless configured otherwise.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

// ── Conversation key ──────────────────────────────────────────────────────────

/// 32-byte key derived from a passphrase. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct ConversationKey([u8; KEY_LEN]);

impl ConversationKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

// ConversationKey is neither Clone nor Debug: one derivation, one use.

// ── Parameters ────────────────────────────────────────────────────────────────

/// PBKDF2 tuning. Both the sealing and the opening side must agree on it;
/// the container does not carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

// ── Derivation ────────────────────────────────────────────────────────────────

/// Derive a conversation key from `passphrase` and a 16-byte `salt`.
///
/// Deterministic: the same (passphrase, salt, params) always yields the same
/// key, which is what lets the receiver reproduce it.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<ConversationKey, CryptoError> {
    if passphrase.is_empty() {
        return Err(CryptoError::KeyDerivation("empty passphrase".into()));
    }
    if params.iterations == 0 {
        return Err(CryptoError::KeyDerivation(
            "iteration count must be at least 1".into(),
        ));
    }
    let mut output = [0u8; KEY_LEN];
    pbkdf2_sha256(passphrase, salt, params.iterations, &mut output)?;
    tracing::trace!(iterations = params.iterations, "conversation key derived");
    Ok(ConversationKey(output))
}

fn pbkdf2_sha256(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output: &mut [u8],
) -> Result<(), CryptoError> {
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, iterations, output)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))
}

/// Generate a fresh random 16-byte salt. One per container, never reused.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}
