//! Client identity and the handle used to reach a connection.

use std::{fmt, net::SocketAddr};

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Identifier of one accepted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl fmt::Display for ClientId {
    /// Short form (first 8 hex digits), enough to tell clients apart in logs
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.0.simple().to_string();
        f.write_str(&simple[..8])
    }
}

/// Generates fresh client ids
pub struct ClientIdFactory;

impl ClientIdFactory {
    pub fn generate() -> ClientId {
        ClientId(Uuid::new_v4())
    }
}

/// Frames a connection may have queued but not yet written
pub const OUTBOX_CAPACITY: usize = 1024;

/// Sending side of a connection's outbound frame queue
pub type Outbox = mpsc::Sender<Bytes>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("client {0} is no longer reachable")]
    Closed(ClientId),
    #[error("client {0} is not reading its messages")]
    Full(ClientId),
}

/// Opaque reference to one live connection.
///
/// Pushing a frame only enqueues it; the connection's writer task performs
/// the socket write, so a push never blocks. A peer that stops reading fills
/// its queue, and further pushes fail with [`PushError::Full`].
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ClientId,
    peer: SocketAddr,
    outbox: Outbox,
}

impl ClientHandle {
    pub fn new(id: ClientId, peer: SocketAddr, outbox: Outbox) -> Self {
        Self { id, peer, outbox }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Queue an encoded payload for delivery.
    ///
    /// Fails once the connection's writer has stopped or its queue is full.
    pub fn push(&self, frame: Bytes) -> Result<(), PushError> {
        self.outbox.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => PushError::Full(self.id),
            TrySendError::Closed(_) => PushError::Closed(self.id),
        })
    }
}
