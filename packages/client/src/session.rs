//! Client chat session over one connection.
//!
//! Two tasks run side by side: inbound prints every packet the server
//! relays, outbound sends what the user types. When either ends, the other
//! is aborted.

use std::sync::Arc;

use fhub_shared::{
    chat_log::{ChatLog, DEFAULT_MAX_ENTRIES, OverflowPolicy},
    console::{Console, ConsoleLine},
    frame::{PacketReader, PacketWriter},
    packet::{ChatPacket, Packet},
    time::now_millis,
};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc,
};

use crate::{
    domain::{ClientCommand, Input, parse_input},
    error::ClientError,
    formatter::MessageFormatter,
};

/// How a session ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// `/exit` or end of input
    UserExit,
    /// The server sent a `Shutdown` packet
    ServerShutdown,
}

/// Run the client session until the user leaves or the server goes away.
pub async fn run_session<R, W>(
    reader: R,
    writer: W,
    username: &str,
    lines: mpsc::UnboundedReceiver<String>,
    console: Arc<dyn Console>,
) -> Result<SessionEnd, ClientError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    console.emit(ConsoleLine::plain(MessageFormatter::welcome()));

    let mut inbound = tokio::spawn(inbound_loop(PacketReader::new(reader), console.clone()));
    let mut outbound = tokio::spawn(outbound_loop(
        PacketWriter::new(writer),
        username.to_string(),
        lines,
        console,
    ));

    // If any one of the tasks completes, abort the other
    let result = tokio::select! {
        result = &mut inbound => {
            outbound.abort();
            result
        }
        result = &mut outbound => {
            inbound.abort();
            result
        }
    };

    result.unwrap_or_else(|e| Err(ClientError::ConnectionLost(e.to_string())))
}

async fn inbound_loop<R>(
    mut reader: PacketReader<R>,
    console: Arc<dyn Console>,
) -> Result<SessionEnd, ClientError>
where
    R: AsyncRead + Unpin,
{
    let mut log = ChatLog::new(DEFAULT_MAX_ENTRIES, OverflowPolicy::EvictOldest);

    loop {
        let payload = match reader.read_frame().await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                return Err(ClientError::ConnectionLost(
                    "server closed the connection without notice".to_string(),
                ));
            }
            Err(e) => return Err(ClientError::ConnectionLost(e.to_string())),
        };

        match Packet::decode(&payload) {
            Ok(Packet::Chat(chat)) => {
                // Lines are shown from the local mirror of the chat log
                let line = match log.append(chat.render(), now_millis()) {
                    Ok(index) => log.get(index).map(|entry| entry.line.clone()),
                    Err(e) => {
                        tracing::debug!("Chat not kept in local log: {}", e);
                        None
                    }
                };
                console.emit(ConsoleLine::chat(line.unwrap_or_else(|| chat.render())));
            }
            Ok(Packet::Shutdown) => {
                tracing::info!("Server sent shutdown");
                console.emit(ConsoleLine::server(MessageFormatter::server_closed()));
                return Ok(SessionEnd::ServerShutdown);
            }
            Err(e) => tracing::warn!("Dropped malformed packet from server: {}", e),
        }
    }
}

async fn outbound_loop<W>(
    mut writer: PacketWriter<W>,
    username: String,
    mut lines: mpsc::UnboundedReceiver<String>,
    console: Arc<dyn Console>,
) -> Result<SessionEnd, ClientError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = lines.recv().await {
        match parse_input(&line) {
            Input::Empty => {}
            Input::Chat(body) => {
                let chat = match ChatPacket::new(username.as_str(), body) {
                    Ok(chat) => chat,
                    Err(e) => {
                        console.emit(ConsoleLine::error(e.to_string()));
                        continue;
                    }
                };
                writer
                    .send(&Packet::Chat(chat))
                    .await
                    .map_err(|e| ClientError::ConnectionLost(e.to_string()))?;
            }
            Input::Command(ClientCommand::Help) => {
                for line in MessageFormatter::help() {
                    console.emit(ConsoleLine::plain(line));
                }
            }
            Input::Command(ClientCommand::Exit) => break,
            Input::Invalid(e) => console.emit(ConsoleLine::error(e.to_string())),
        }
    }

    console.emit(ConsoleLine::server(MessageFormatter::disconnecting()));
    if let Err(e) = writer.send(&Packet::Shutdown).await {
        tracing::debug!("Failed to send shutdown: {}", e);
    }
    if let Err(e) = writer.shutdown().await {
        tracing::debug!("Failed to close connection: {}", e);
    }
    Ok(SessionEnd::UserExit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhub_shared::console::MemoryConsole;
    use tokio::io::{DuplexStream, ReadHalf, WriteHalf};

    struct FakeServer {
        reader: PacketReader<ReadHalf<DuplexStream>>,
        writer: PacketWriter<WriteHalf<DuplexStream>>,
    }

    fn start_session(
        username: &str,
    ) -> (
        FakeServer,
        mpsc::UnboundedSender<String>,
        Arc<MemoryConsole>,
        tokio::task::JoinHandle<Result<SessionEnd, ClientError>>,
    ) {
        let (client_side, server_side) = tokio::io::duplex(8 * 1024);
        let (client_read, client_write) = tokio::io::split(client_side);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (tx, rx) = mpsc::unbounded_channel();
        let console = Arc::new(MemoryConsole::new());
        let session_console: Arc<dyn Console> = console.clone();
        let username = username.to_string();
        let handle = tokio::spawn(async move {
            run_session(client_read, client_write, &username, rx, session_console).await
        });
        let server = FakeServer {
            reader: PacketReader::new(server_read),
            writer: PacketWriter::new(server_write),
        };
        (server, tx, console, handle)
    }

    #[tokio::test]
    async fn test_typed_line_is_sent_as_chat() {
        // テスト項目: a typed line goes out as a chat packet with the configured username
        // given (前提条件):
        let (mut server, tx, _console, _handle) = start_session("bob");

        // when (操作):
        tx.send("hello there".to_string()).unwrap();

        // then (期待する結果):
        let frame = server.reader.read_frame().await.unwrap().unwrap();
        assert_eq!(&frame[..], b"cbob>hello there");
    }

    #[tokio::test]
    async fn test_exit_sends_shutdown_and_closes() {
        // テスト項目: /exit sends Shutdown, closes the stream and ends the session
        // given (前提条件):
        let (mut server, tx, console, handle) = start_session("bob");

        // when (操作):
        tx.send("/exit".to_string()).unwrap();

        // then (期待する結果):
        let frame = server.reader.read_frame().await.unwrap().unwrap();
        assert_eq!(Packet::decode(&frame).unwrap(), Packet::Shutdown);
        assert!(server.reader.read_frame().await.unwrap().is_none());
        assert_eq!(handle.await.unwrap().unwrap(), SessionEnd::UserExit);
        assert!(console.contains("SERVER >> Disconnecting..."));
    }

    #[tokio::test]
    async fn test_end_of_input_is_exit() {
        // テスト項目: closing the input channel behaves like /exit
        // given (前提条件):
        let (mut server, tx, _console, handle) = start_session("bob");

        // when (操作):
        drop(tx);

        // then (期待する結果):
        let frame = server.reader.read_frame().await.unwrap().unwrap();
        assert_eq!(Packet::decode(&frame).unwrap(), Packet::Shutdown);
        assert_eq!(handle.await.unwrap().unwrap(), SessionEnd::UserExit);
    }

    #[tokio::test]
    async fn test_relayed_chat_is_printed() {
        // テスト項目: relayed chat is rendered as `sender >> body`
        // given (前提条件):
        let (mut server, _tx, console, handle) = start_session("bob");

        // when (操作):
        server
            .writer
            .send(&Packet::chat("alice", "hi bob").unwrap())
            .await
            .unwrap();
        server.writer.send(&Packet::Shutdown).await.unwrap();

        // then (期待する結果):
        assert_eq!(handle.await.unwrap().unwrap(), SessionEnd::ServerShutdown);
        let rendered = console.rendered();
        assert!(rendered.contains(&"alice >> hi bob".to_string()));
        assert!(rendered.contains(&"SERVER >> Server closed the connection".to_string()));
    }

    #[tokio::test]
    async fn test_local_commands_are_not_sent() {
        // テスト項目: /help and unknown commands are handled locally and never reach the server
        // given (前提条件):
        let (mut server, tx, console, _handle) = start_session("bob");

        // when (操作):
        tx.send("/h".to_string()).unwrap();
        tx.send("/dance".to_string()).unwrap();
        tx.send("after".to_string()).unwrap();

        // then (期待する結果):
        let frame = server.reader.read_frame().await.unwrap().unwrap();
        assert_eq!(&frame[..], b"cbob>after");
        assert!(console.contains("FHUB (CLIENT) VERSION"));
        assert!(console.contains("ERROR >> Invalid command: /dance"));
    }

    #[tokio::test]
    async fn test_server_eof_is_connection_lost() {
        // テスト項目: EOF from the server without a shutdown notice is a lost connection
        // given (前提条件):
        let (mut server, _tx, _console, handle) = start_session("bob");

        // when (操作):
        server.writer.shutdown().await.unwrap();

        // then (期待する結果):
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(ClientError::ConnectionLost(_))));
    }
}
