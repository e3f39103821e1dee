//! Client execution logic.
//!
//! There is no reconnection: a lost connection ends the client.

use std::{net::SocketAddr, sync::Arc};

use fhub_shared::console::Console;
use tokio::{
    net::{TcpSocket, TcpStream},
    sync::mpsc,
};

use crate::{
    error::ClientError,
    session::{SessionEnd, run_session},
};

/// Open the TCP connection to the server.
pub async fn connect(addr: SocketAddr) -> Result<TcpStream, ClientError> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(ClientError::SocketCreate)?;

    let stream = socket
        .connect(addr)
        .await
        .map_err(|source| ClientError::Connect { addr, source })?;
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!("Failed to set TCP_NODELAY: {}", e);
    }
    tracing::info!("Connected to {}", addr);
    Ok(stream)
}

/// Run a chat session on an established connection.
pub async fn run_client(
    stream: TcpStream,
    username: &str,
    lines: mpsc::UnboundedReceiver<String>,
    console: Arc<dyn Console>,
) -> Result<SessionEnd, ClientError> {
    let (reader, writer) = stream.into_split();
    let end = run_session(reader, writer, username, lines, console).await?;
    tracing::info!("Session ended: {:?}", end);
    Ok(end)
}
