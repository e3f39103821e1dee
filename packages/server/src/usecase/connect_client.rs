//! UseCase: registering an accepted connection

use std::{net::SocketAddr, sync::Arc};

use tokio::sync::Mutex;

use crate::domain::{ClientHandle, ClientId, ClientIdFactory, ClientRegistry, Outbox, RegistryError};

pub struct ConnectClientUseCase {
    registry: Arc<Mutex<ClientRegistry>>,
}

impl ConnectClientUseCase {
    pub fn new(registry: Arc<Mutex<ClientRegistry>>) -> Self {
        Self { registry }
    }

    /// Give the connection an id and make it eligible for broadcasts.
    ///
    /// # Arguments
    ///
    /// * `peer` - remote address of the connection
    /// * `outbox` - queue drained by the connection's writer task
    pub async fn execute(&self, peer: SocketAddr, outbox: Outbox) -> Result<ClientId, RegistryError> {
        let handle = ClientHandle::new(ClientIdFactory::generate(), peer, outbox);
        let id = self.registry.lock().await.register(handle)?;
        tracing::debug!("Registered client {} ({})", id, peer);
        Ok(id)
    }
}
