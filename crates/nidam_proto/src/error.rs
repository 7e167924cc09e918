use nidam_crypto::CryptoError;
use thiserror::Error;

/// Everything that can go wrong while sealing, opening, or sharing a
/// conversation.
///
/// `AuthenticationFailure` carries no detail: a wrong passphrase and a
/// tampered container are indistinguishable to the caller.
#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication failed: wrong passphrase or tampered container")]
    AuthenticationFailure,

    #[error("Conversation format error: {0}")]
    FormatError(String),

    #[error("Serialisation error: {0}")]
    Serialisation(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Peer link not initialised")]
    NotInitialized,

    #[error("No connection to peer {0}")]
    NotConnected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl ShareError {
    /// True for the outcomes a user should only ever see as
    /// "could not open conversation".
    pub fn is_unopenable(&self) -> bool {
        matches!(self, Self::AuthenticationFailure | Self::FormatError(_))
    }
}
