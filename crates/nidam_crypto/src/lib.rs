//! nidam_crypto: cryptographic primitives for NIDAM conversation sharing
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize all secret material on drop.
//! - Keys are opaque newtypes; raw bytes never escape by accident.
//!
//! # Module layout
//! - `kdf`    : PBKDF2-HMAC-SHA256 passphrase → key derivation, salt generation
//! - `aead`   : AES-256-GCM encrypt/decrypt helpers, nonce generation
//! - `error`  : unified error type

pub mod aead;
pub mod error;
pub mod kdf;

pub use error::CryptoError;
pub use kdf::{ConversationKey, KdfParams};
