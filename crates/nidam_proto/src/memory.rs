//! In-process peer transport.
//!
//! A [`MemoryHub`] plays the role of the signalling server: endpoints
//! register under a random id and dial each other by that id. Payloads move
//! over unbounded tokio channels, intact and in order.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::ShareError;
use crate::share::{PeerConnection, PeerTransport};

/// Inbound connections wait here until `accept`. Unbounded: an endpoint
/// that never accepts holds every dialled link until it is closed.
type Inbox = mpsc::UnboundedSender<MemoryConnection>;

/// Shared registry of open endpoints. Clone to hand out to each side.
#[derive(Clone, Default)]
pub struct MemoryHub {
    endpoints: Arc<Mutex<HashMap<String, Inbox>>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport(&self) -> MemoryTransport {
        MemoryTransport {
            hub: self.clone(),
            local_id: None,
            incoming: None,
        }
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.lock().len()
    }
}

pub struct MemoryTransport {
    hub: MemoryHub,
    local_id: Option<String>,
    incoming: Option<mpsc::UnboundedReceiver<MemoryConnection>>,
}

#[async_trait]
impl PeerTransport for MemoryTransport {
    type Connection = MemoryConnection;

    async fn open(&mut self) -> Result<String, ShareError> {
        if let Some(id) = &self.local_id {
            return Err(ShareError::Transport(format!("endpoint {id} already open")));
        }
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        self.hub.endpoints.lock().insert(id.clone(), tx);
        self.local_id = Some(id.clone());
        self.incoming = Some(rx);
        Ok(id)
    }

    async fn connect(&mut self, peer_id: &str) -> Result<MemoryConnection, ShareError> {
        let local_id = self.local_id.clone().ok_or(ShareError::NotInitialized)?;
        let inbox = self
            .hub
            .endpoints
            .lock()
            .get(peer_id)
            .cloned()
            .ok_or_else(|| ShareError::Transport(format!("unknown peer {peer_id}")))?;

        let (to_remote, from_local) = mpsc::unbounded_channel();
        let (to_local, from_remote) = mpsc::unbounded_channel();
        let remote_side = MemoryConnection {
            peer_id: local_id,
            tx: Some(to_local),
            rx: from_local,
        };
        inbox
            .send(remote_side)
            .map_err(|_| ShareError::Transport(format!("peer {peer_id} is not accepting")))?;

        Ok(MemoryConnection {
            peer_id: peer_id.to_string(),
            tx: Some(to_remote),
            rx: from_remote,
        })
    }

    async fn accept(&mut self) -> Option<MemoryConnection> {
        self.incoming.as_mut()?.recv().await
    }

    async fn close(&mut self) {
        self.unregister();
    }
}

impl MemoryTransport {
    /// Drop the hub entry and any connections still waiting in the inbox.
    fn unregister(&mut self) {
        if let Some(id) = self.local_id.take() {
            self.hub.endpoints.lock().remove(&id);
        }
        self.incoming = None;
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.unregister();
    }
}

pub struct MemoryConnection {
    peer_id: String,
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

#[async_trait]
impl PeerConnection for MemoryConnection {
    fn peer_id(&self) -> &str {
        &self.peer_id
    }

    async fn send(&mut self, payload: Vec<u8>) -> Result<(), ShareError> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| ShareError::Transport("connection closed".into()))?;
        tx.send(payload)
            .map_err(|_| ShareError::Transport(format!("peer {} went away", self.peer_id)))
    }

    async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    async fn close(&mut self) {
        self.tx = None;
        self.rx.close();
    }
}
