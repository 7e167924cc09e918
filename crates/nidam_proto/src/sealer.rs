//! Conversation sealing (encode) and opening (decode).
//!
//! seal:  conversation → canonical JSON → fresh salt + nonce
//!        → PBKDF2 key → AES-256-GCM → container with fresh UUID
//! open:  container → validate fields → PBKDF2 key (container salt)
//!        → AES-256-GCM verify/decrypt → conversation
//!
//! Every call is self-contained. Keys and plaintext buffers are zeroized
//! when the call returns and are never cached between calls.

use tracing::{debug, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use nidam_crypto::aead;
use nidam_crypto::kdf::{derive_key, generate_salt, KdfParams};

use crate::container::EncryptedConversation;
use crate::error::ShareError;
use crate::message::Conversation;

/// Associated data bound into the tag. Empty so containers stay
/// interchangeable with the chat front end's exports.
const CONTAINER_AAD: &[u8] = b"";

/// Stateless sealer; holds only KDF configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversationSealer {
    kdf: KdfParams,
}

impl ConversationSealer {
    pub fn new(kdf: KdfParams) -> Self {
        Self { kdf }
    }

    pub fn kdf_params(&self) -> KdfParams {
        self.kdf
    }

    /// Encrypt `conversation` under `passphrase` into a fresh container.
    pub fn seal(
        &self,
        conversation: &Conversation,
        passphrase: &str,
    ) -> Result<EncryptedConversation, ShareError> {
        require_passphrase(passphrase)?;

        let plaintext = conversation.to_canonical_bytes()?;
        let salt = generate_salt();
        let nonce = aead::generate_nonce();
        let key = derive_key(passphrase.as_bytes(), &salt, &self.kdf)?;
        let ciphertext = aead::encrypt(&key, &nonce, &plaintext, CONTAINER_AAD)?;

        let container = EncryptedConversation::from_parts(
            Uuid::new_v4().to_string(),
            &salt,
            &nonce,
            &ciphertext,
        );
        debug!(
            id = %container.id(),
            messages = conversation.len(),
            ciphertext_len = ciphertext.len(),
            "conversation sealed"
        );
        Ok(container)
    }

    /// Recover the conversation from `container`.
    ///
    /// A wrong passphrase and a tampered container both yield
    /// [`ShareError::AuthenticationFailure`]. A container that authenticates
    /// but does not hold a conversation yields [`ShareError::FormatError`].
    pub fn open(
        &self,
        container: &EncryptedConversation,
        passphrase: &str,
    ) -> Result<Conversation, ShareError> {
        require_passphrase(passphrase)?;
        let parts = container.parts().map_err(|err| {
            warn!(id = %container.id(), error = %err, "rejected malformed container");
            err
        })?;

        let key = derive_key(passphrase.as_bytes(), &parts.salt, &self.kdf)?;
        let plaintext = aead::decrypt(&key, &parts.nonce, &parts.ciphertext, CONTAINER_AAD)
            .map_err(|_| {
                debug!(id = %container.id(), "container failed authentication");
                ShareError::AuthenticationFailure
            })?;

        let conversation = Conversation::from_slice(&plaintext)
            .map_err(|e| ShareError::FormatError(e.to_string()))?;
        debug!(id = %container.id(), messages = conversation.len(), "conversation opened");
        Ok(conversation)
    }

    /// [`Self::seal`] on the blocking pool, so key derivation does not stall
    /// an async executor thread.
    pub async fn seal_async(
        self,
        conversation: Conversation,
        passphrase: Zeroizing<String>,
    ) -> Result<EncryptedConversation, ShareError> {
        tokio::task::spawn_blocking(move || self.seal(&conversation, &passphrase))
            .await
            .map_err(|e| ShareError::Worker(e.to_string()))?
    }

    /// [`Self::open`] on the blocking pool.
    pub async fn open_async(
        self,
        container: EncryptedConversation,
        passphrase: Zeroizing<String>,
    ) -> Result<Conversation, ShareError> {
        tokio::task::spawn_blocking(move || self.open(&container, &passphrase))
            .await
            .map_err(|e| ShareError::Worker(e.to_string()))?
    }
}

/// Seal with the default KDF parameters.
pub fn encode(
    conversation: &Conversation,
    passphrase: &str,
) -> Result<EncryptedConversation, ShareError> {
    ConversationSealer::default().seal(conversation, passphrase)
}

/// Open with the default KDF parameters.
pub fn decode(container: &EncryptedConversation, passphrase: &str) -> Result<Conversation, ShareError> {
    ConversationSealer::default().open(container, passphrase)
}

fn require_passphrase(passphrase: &str) -> Result<(), ShareError> {
    if passphrase.is_empty() {
        return Err(ShareError::InvalidInput("passphrase must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn sealer() -> ConversationSealer {
        ConversationSealer::new(KdfParams { iterations: 1_000 })
    }

    fn hello() -> Conversation {
        vec![Message::user(1, "hello", 1_700_000_000_000)].into()
    }

    #[test]
    fn seal_open_roundtrip() {
        let c = sealer().seal(&hello(), "correct horse").unwrap();
        assert_eq!(sealer().open(&c, "correct horse").unwrap(), hello());
    }

    #[test]
    fn wrong_passphrase_is_authentication_failure() {
        let c = sealer().seal(&hello(), "correct horse").unwrap();
        assert!(matches!(
            sealer().open(&c, "wrong horse"),
            Err(ShareError::AuthenticationFailure)
        ));
    }

    #[test]
    fn empty_passphrase_rejected_both_ways() {
        assert!(matches!(
            sealer().seal(&hello(), ""),
            Err(ShareError::InvalidInput(_))
        ));
        let c = sealer().seal(&hello(), "pw").unwrap();
        assert!(matches!(sealer().open(&c, ""), Err(ShareError::InvalidInput(_))));
    }

    #[test]
    fn mismatched_iterations_fail_authentication() {
        let c = sealer().seal(&hello(), "pw").unwrap();
        let other = ConversationSealer::new(KdfParams { iterations: 999 });
        assert!(matches!(other.open(&c, "pw"), Err(ShareError::AuthenticationFailure)));
    }

    #[test]
    fn empty_conversation_roundtrip() {
        let c = sealer().seal(&Conversation::default(), "pw").unwrap();
        assert!(sealer().open(&c, "pw").unwrap().is_empty());
    }

    #[test]
    fn non_conversation_plaintext_is_format_error() {
        let salt = generate_salt();
        let nonce = aead::generate_nonce();
        let key = derive_key(b"pw", &salt, &sealer().kdf_params()).unwrap();
        let ct = aead::encrypt(&key, &nonce, br#"{"not":"a conversation"}"#, CONTAINER_AAD).unwrap();
        let c = EncryptedConversation::from_parts("id-1", &salt, &nonce, &ct);

        let err = sealer().open(&c, "pw").unwrap_err();
        assert!(matches!(err, ShareError::FormatError(_)));
        assert!(err.is_unopenable());
    }

    #[tokio::test]
    async fn async_roundtrip() {
        let s = sealer();
        let c = s
            .seal_async(hello(), Zeroizing::new("correct horse".to_string()))
            .await
            .unwrap();
        let back = s
            .open_async(c, Zeroizing::new("correct horse".to_string()))
            .await
            .unwrap();
        assert_eq!(back, hello());
    }
}
