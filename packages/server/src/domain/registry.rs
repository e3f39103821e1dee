//! The set of connections eligible for broadcast.

use thiserror::Error;

use super::client::{ClientHandle, ClientId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("client {0} is already registered")]
    DuplicateClient(ClientId),
    #[error("server is shutting down")]
    Closed,
}

/// Registered client handles in registration order.
///
/// Plain owned data; the server shares it behind a mutex. Once closed it
/// accepts no new members.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Vec<ClientHandle>,
    closed: bool,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handle: ClientHandle) -> Result<ClientId, RegistryError> {
        if self.closed {
            return Err(RegistryError::Closed);
        }
        let id = handle.id();
        if self.contains(&id) {
            return Err(RegistryError::DuplicateClient(id));
        }
        self.clients.push(handle);
        Ok(id)
    }

    /// Remove a client. Removing an unknown or already removed id is a no-op
    /// and returns `None`.
    pub fn unregister(&mut self, id: &ClientId) -> Option<ClientHandle> {
        let position = self.clients.iter().position(|c| &c.id() == id)?;
        Some(self.clients.remove(position))
    }

    /// Refuse every later `register`. Current members stay.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Copy of the current membership, in registration order.
    pub fn snapshot(&self) -> Vec<ClientHandle> {
        self.clients.clone()
    }

    pub fn contains(&self, id: &ClientId) -> bool {
        self.clients.iter().any(|c| &c.id() == id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
