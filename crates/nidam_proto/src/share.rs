//! Share packets and the peer transport seam.
//!
//! The peer-to-peer library itself is an external collaborator; it only has
//! to move opaque byte payloads between two endpoints. This module fixes
//! what those payloads are and keeps the per-peer connection table.
//!
//! Packet on the wire:
//!   { "type": "conversation", "conversation": { id, encryptedData, iv, salt } }
//!
//! The receiver never decrypts here: it hands the container to whoever holds
//! the passphrase.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::container::EncryptedConversation;
use crate::error::ShareError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SharePacket {
    Conversation { conversation: EncryptedConversation },
}

impl SharePacket {
    pub fn to_bytes(&self) -> Result<Vec<u8>, ShareError> {
        serde_json::to_vec(self).map_err(|e| ShareError::Serialisation(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ShareError> {
        serde_json::from_slice(bytes)
            .map_err(|e| ShareError::InvalidInput(format!("malformed share packet: {e}")))
    }
}

// ── Transport seam ────────────────────────────────────────────────────────────

/// Endpoint of a peer-to-peer data link.
#[async_trait]
pub trait PeerTransport: Send {
    type Connection: PeerConnection;

    /// Register the local endpoint; returns its id (what peers dial).
    async fn open(&mut self) -> Result<String, ShareError>;

    /// Dial a remote endpoint.
    async fn connect(&mut self, peer_id: &str) -> Result<Self::Connection, ShareError>;

    /// Next inbound connection, or `None` once the endpoint is gone.
    async fn accept(&mut self) -> Option<Self::Connection>;

    /// Unregister the local endpoint. A later `open` starts a fresh one.
    async fn close(&mut self);
}

/// One established link to a peer.
#[async_trait]
pub trait PeerConnection: Send {
    fn peer_id(&self) -> &str;

    async fn send(&mut self, payload: Vec<u8>) -> Result<(), ShareError>;

    /// Next payload from the peer, or `None` once the link is closed.
    async fn recv(&mut self) -> Option<Vec<u8>>;

    async fn close(&mut self);
}

// ── Share manager ─────────────────────────────────────────────────────────────

/// Keeps the local endpoint and one connection per peer id.
pub struct ShareManager<T: PeerTransport> {
    transport: T,
    local_id: Option<String>,
    connections: HashMap<String, T::Connection>,
}

impl<T: PeerTransport> ShareManager<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            local_id: None,
            connections: HashMap::new(),
        }
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn is_connected(&self, peer_id: &str) -> bool {
        self.connections.contains_key(peer_id)
    }

    pub async fn initialize(&mut self) -> Result<String, ShareError> {
        let id = self.transport.open().await?;
        info!(local_id = %id, "peer link established");
        self.local_id = Some(id.clone());
        Ok(id)
    }

    pub async fn connect_to_peer(&mut self, peer_id: &str) -> Result<(), ShareError> {
        self.require_initialized()?;
        let conn = self.transport.connect(peer_id).await?;
        debug!(peer_id, "connected to peer");
        self.register(conn).await;
        Ok(())
    }

    /// Wait for a peer to dial us and register the link. Returns its id.
    pub async fn accept_peer(&mut self) -> Result<String, ShareError> {
        self.require_initialized()?;
        let conn = self
            .transport
            .accept()
            .await
            .ok_or_else(|| ShareError::Transport("endpoint closed".into()))?;
        let peer_id = conn.peer_id().to_string();
        debug!(peer_id = %peer_id, "accepted peer connection");
        self.register(conn).await;
        Ok(peer_id)
    }

    pub async fn send_conversation(
        &mut self,
        peer_id: &str,
        conversation: &EncryptedConversation,
    ) -> Result<(), ShareError> {
        self.require_initialized()?;
        let conn = self
            .connections
            .get_mut(peer_id)
            .ok_or_else(|| ShareError::NotConnected(peer_id.to_string()))?;
        let packet = SharePacket::Conversation {
            conversation: conversation.clone(),
        };
        conn.send(packet.to_bytes()?).await?;
        debug!(peer_id, id = %conversation.id(), "sent encrypted conversation");
        Ok(())
    }

    /// Wait for the next conversation from `peer_id`. Packets that do not
    /// parse are dropped; a closed link is removed from the table.
    pub async fn receive_conversation(
        &mut self,
        peer_id: &str,
    ) -> Result<EncryptedConversation, ShareError> {
        self.require_initialized()?;
        let conn = self
            .connections
            .get_mut(peer_id)
            .ok_or_else(|| ShareError::NotConnected(peer_id.to_string()))?;

        loop {
            let Some(bytes) = conn.recv().await else {
                self.connections.remove(peer_id);
                debug!(peer_id, "peer closed the connection");
                return Err(ShareError::NotConnected(peer_id.to_string()));
            };
            match SharePacket::from_bytes(&bytes) {
                Ok(SharePacket::Conversation { conversation }) => {
                    debug!(peer_id, id = %conversation.id(), "received encrypted conversation");
                    return Ok(conversation);
                }
                Err(err) => warn!(peer_id, error = %err, "dropping unreadable packet"),
            }
        }
    }

    /// Close every link and the local endpoint. `initialize` may be called
    /// again afterwards.
    pub async fn disconnect(&mut self) {
        for (_, mut conn) in self.connections.drain() {
            conn.close().await;
        }
        self.transport.close().await;
        if let Some(id) = self.local_id.take() {
            info!(local_id = %id, "peer link closed");
        }
    }

    async fn register(&mut self, conn: T::Connection) {
        if let Some(mut previous) = self.connections.insert(conn.peer_id().to_string(), conn) {
            previous.close().await;
        }
    }

    fn require_initialized(&self) -> Result<(), ShareError> {
        if self.local_id.is_none() {
            return Err(ShareError::NotInitialized);
        }
        Ok(())
    }
}
