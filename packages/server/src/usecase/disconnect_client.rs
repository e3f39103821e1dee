//! UseCase: removing a connection from the broadcast set

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{ClientId, ClientRegistry};

pub struct DisconnectClientUseCase {
    registry: Arc<Mutex<ClientRegistry>>,
}

impl DisconnectClientUseCase {
    pub fn new(registry: Arc<Mutex<ClientRegistry>>) -> Self {
        Self { registry }
    }

    /// Unregister the client and report whether it was still registered.
    ///
    /// The broadcaster may already have removed a client whose outbox
    /// closed, so a `false` here is expected and harmless.
    pub async fn execute(&self, client_id: &ClientId) -> bool {
        let removed = self.registry.lock().await.unregister(client_id).is_some();
        if removed {
            tracing::debug!("Unregistered client {}", client_id);
        }
        removed
    }
}
