//! Per-connection handler for the framed TCP protocol.
//!
//! Lifecycle: `Connected -> Relaying -> Disconnecting -> Closed`.
//!
//! While relaying, the handler waits on three things at once: the next
//! inbound frame, the connection's writer task and the global shutdown
//! flag. Whichever ends the relay, the disconnect path is the same:
//! unregister, let the writer flush what is already queued (bounded by
//! [`DRAIN_TIMEOUT`]), close.

use std::{fmt, net::SocketAddr, sync::Arc, time::Duration};

use fhub_shared::{
    console::ConsoleLine,
    frame::{PacketReader, PacketWriter},
    packet::{ChatPacket, Packet},
};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc,
};

use crate::{
    domain::{ClientId, OUTBOX_CAPACITY, RegistryError},
    infrastructure::pusher_loop,
    ui::state::AppState,
};

/// Upper bound on flushing queued frames after the relay loop ends
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Relaying,
    Disconnecting,
    Closed,
}

/// Why a connection left the relaying state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The client sent a `Shutdown` packet
    PeerShutdown,
    /// Clean EOF from the client
    PeerClosed,
    /// Reset, oversized frame or EOF mid-frame
    ReadError,
    /// The writer task stopped (socket write failed)
    WriteFailed,
    /// Global shutdown
    ServerShutdown,
    /// The connection could not be registered
    Rejected,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DisconnectReason::PeerShutdown => "client left",
            DisconnectReason::PeerClosed => "connection closed by client",
            DisconnectReason::ReadError => "read error",
            DisconnectReason::WriteFailed => "write failed",
            DisconnectReason::ServerShutdown => "server shutdown",
            DisconnectReason::Rejected => "registration rejected",
        };
        f.write_str(text)
    }
}

struct Connection {
    peer: SocketAddr,
    state: ConnectionState,
}

impl Connection {
    fn transition(&mut self, next: ConnectionState) {
        tracing::debug!("{}: {:?} -> {:?}", self.peer, self.state, next);
        self.state = next;
    }
}

/// Serve one accepted connection until it closes.
pub async fn handle_connection<R, W>(
    reader: R,
    writer: W,
    peer: SocketAddr,
    state: Arc<AppState>,
) -> DisconnectReason
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut conn = Connection {
        peer,
        state: ConnectionState::Connected,
    };
    let mut shutdown = state.shutdown_listener();

    // The registry holds the only sender, so unregistering closes the queue
    let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);

    let client_id = match state.connect_client_usecase.execute(peer, tx).await {
        Ok(id) => id,
        Err(RegistryError::Closed) => {
            tracing::info!("Turned away {} during shutdown", peer);
            send_shutdown_notice(PacketWriter::new(writer), peer).await;
            conn.transition(ConnectionState::Closed);
            return DisconnectReason::ServerShutdown;
        }
        Err(e) => {
            tracing::error!("Failed to register {}: {}", peer, e);
            state.emit(ConsoleLine::error(e.to_string()));
            conn.transition(ConnectionState::Closed);
            return DisconnectReason::Rejected;
        }
    };
    let mut pusher = pusher_loop(rx, PacketWriter::new(writer));
    tracing::info!("Client {} connected from {}", client_id, peer);
    state.monitor(format!("New client connected ({})", peer));

    conn.transition(ConnectionState::Relaying);
    let mut reader = PacketReader::new(reader);
    let mut pusher_finished = false;

    let reason = loop {
        tokio::select! {
            frame = reader.read_frame() => match frame {
                Ok(Some(payload)) => match Packet::decode(&payload) {
                    Ok(Packet::Chat(chat)) => {
                        state.monitor(format!("received new packet: {}", chat.render()));
                        relay(&state, client_id, &chat).await;
                    }
                    Ok(Packet::Shutdown) => break DisconnectReason::PeerShutdown,
                    Err(e) => {
                        tracing::warn!("Dropped malformed packet from {}: {}", peer, e);
                        state.monitor(format!("dropped malformed packet from {}: {}", peer, e));
                    }
                },
                Ok(None) => break DisconnectReason::PeerClosed,
                Err(e) => {
                    tracing::debug!("Read from {} failed: {}", peer, e);
                    break DisconnectReason::ReadError;
                }
            },
            result = &mut pusher, if !pusher_finished => {
                pusher_finished = true;
                match result {
                    Ok(Ok(())) => tracing::debug!("Writer for {} closed", peer),
                    Ok(Err(e)) => tracing::debug!("Write to {} failed: {}", peer, e),
                    Err(e) => tracing::warn!("Writer task for {} ended abnormally: {}", peer, e),
                }
                break DisconnectReason::WriteFailed;
            }
            _ = shutdown.wait() => break DisconnectReason::ServerShutdown,
        }
    };

    conn.transition(ConnectionState::Disconnecting);
    state.disconnect_client_usecase.execute(&client_id).await;

    if !pusher_finished {
        match tokio::time::timeout(DRAIN_TIMEOUT, &mut pusher).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => tracing::debug!("Final flush to {} failed: {}", peer, e),
            Ok(Err(e)) => tracing::warn!("Writer task for {} ended abnormally: {}", peer, e),
            Err(_) => {
                tracing::warn!("Writer for {} did not drain in time", peer);
                pusher.abort();
            }
        }
    }

    conn.transition(ConnectionState::Closed);
    tracing::info!("Client {} disconnected: {}", client_id, reason);
    state.monitor(format!("client disconnected ({}, {})", peer, reason));
    reason
}

/// Tell a connection that arrived too late that the server is going away.
async fn send_shutdown_notice<W>(mut writer: PacketWriter<W>, peer: SocketAddr)
where
    W: AsyncWrite + Unpin,
{
    let notice = async {
        writer.send(&Packet::Shutdown).await?;
        writer.shutdown().await
    };
    match tokio::time::timeout(DRAIN_TIMEOUT, notice).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!("Shutdown notice to {} failed: {}", peer, e),
        Err(_) => tracing::warn!("Shutdown notice to {} timed out", peer),
    }
}

async fn relay(state: &AppState, sender: ClientId, chat: &ChatPacket) {
    match state.relay_chat_usecase.execute(chat, None).await {
        Ok(report) => {
            state.monitor(format!(
                "updating client chatrooms (#{} to {} client(s))",
                report.index, report.delivered
            ));
        }
        Err(e) => {
            tracing::error!("Chat from {} not relayed: {}", sender, e);
            state.emit(ConsoleLine::error(e.to_string()));
        }
    }
}
