//! nidam_proto: Conversation container, sealing, and peer share packets
//!
//! An exported conversation travels as a small JSON container
//! (`id`, `encryptedData`, `iv`, `salt`). Only someone holding the
//! passphrase it was sealed with can open it; any change to the salt, the
//! nonce or the ciphertext makes opening fail.
//!
//! # Modules
//! - `message`    : Plaintext chat messages and the conversation sequence
//! - `container`  : Encrypted conversation container (the wire/at-rest artifact)
//! - `sealer`     : Encoder / decoder: passphrase + conversation ⇄ container
//! - `share`      : Share packets and the peer transport seam
//! - `memory`     : In-process peer transport (loopback, tests)
//! - `transcript` : Plain-text rendering of a conversation
//! - `error`      : Share error taxonomy

pub mod container;
pub mod error;
pub mod memory;
pub mod message;
pub mod sealer;
pub mod share;
pub mod transcript;

pub use container::{ContainerParts, EncryptedConversation};
pub use error::ShareError;
pub use memory::{MemoryConnection, MemoryHub, MemoryTransport};
pub use message::{Conversation, Message, Sender};
pub use sealer::{decode, encode, ConversationSealer};
pub use share::{PeerConnection, PeerTransport, ShareManager, SharePacket};
pub use transcript::{render_transcript, TranscriptLabels};

pub use nidam_crypto::KdfParams;
