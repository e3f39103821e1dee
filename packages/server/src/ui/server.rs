//! Listener and accept loop.

use std::{net::SocketAddr, sync::Arc};

use fhub_shared::console::ConsoleLine;
use tokio::{
    net::{TcpListener, TcpSocket},
    task::JoinSet,
};

use crate::{config::LISTEN_BACKLOG, error::ServerError};

use super::{handler::handle_connection, state::AppState};

/// FHUB chat server bound to a TCP port
///
/// # Example
///
/// ```ignore
/// let server = Server::bind(config.addr)?;
/// server.run(state.clone()).await;
/// ```
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Create, configure, bind and listen, each step with its own error.
    ///
    /// Must be called inside a tokio runtime.
    pub fn bind(addr: SocketAddr) -> Result<Self, ServerError> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(ServerError::SocketCreate)?;

        socket
            .set_reuseaddr(true)
            .map_err(ServerError::SocketOption)?;
        socket
            .bind(addr)
            .map_err(|source| ServerError::Bind { addr, source })?;
        let listener = socket.listen(LISTEN_BACKLOG).map_err(ServerError::Listen)?;

        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until shutdown, then wait for every handler.
    pub async fn run(self, state: Arc<AppState>) {
        let listener = self.listener;
        let mut shutdown = state.shutdown_listener();
        let mut handlers = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            tracing::debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
                        }
                        let (reader, writer) = stream.into_split();
                        handlers.spawn(handle_connection(reader, writer, peer, state.clone()));
                    }
                    Err(e) => {
                        tracing::error!("Failed to accept: {}", e);
                        state.emit(ConsoleLine::error("failed to accept"));
                    }
                },
                Some(finished) = handlers.join_next() => {
                    if let Err(e) = finished {
                        tracing::warn!("Connection task ended abnormally: {}", e);
                    }
                }
                _ = shutdown.wait() => break,
            }
        }

        drop(listener);
        tracing::info!("Listener closed, waiting for {} connection(s)", handlers.len());
        while let Some(finished) = handlers.join_next().await {
            if let Err(e) = finished {
                tracing::warn!("Connection task ended abnormally: {}", e);
            }
        }
        tracing::info!("Server shutdown complete");
    }
}
