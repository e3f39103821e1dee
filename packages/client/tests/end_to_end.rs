//! End-to-end tests: a real FHUB server and clients over loopback TCP.

use std::{sync::Arc, time::Duration};

use fhub_client::{
    error::ClientError,
    runner::{connect, run_client},
    session::SessionEnd,
};
use fhub_server::{
    config::ServerConfig,
    ui::{AppState, Server},
};
use fhub_shared::{
    console::{Console, MemoryConsole},
    frame::PacketWriter,
    packet::Packet,
    time::FixedClock,
};
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle, time::timeout};

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    addr: std::net::SocketAddr,
    state: Arc<AppState>,
}

async fn start_server() -> Harness {
    let state = Arc::new(AppState::new(
        &ServerConfig::default(),
        Arc::new(MemoryConsole::new()),
        Arc::new(FixedClock::new(0)),
    ));
    let server = Server::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run(state.clone()));
    Harness { addr, state }
}

async fn wait_for_clients(state: &AppState, expected: usize) {
    for _ in 0..200 {
        if state.connected_clients().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {expected} connected clients");
}

async fn wait_for_line(console: &MemoryConsole, needle: &str) {
    for _ in 0..200 {
        if console.contains(needle) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("console never showed '{needle}': {:?}", console.rendered());
}

/// Start a client session as `username` and return its input, console and task
async fn start_client(
    harness: &Harness,
    username: &str,
) -> (
    mpsc::UnboundedSender<String>,
    Arc<MemoryConsole>,
    JoinHandle<Result<SessionEnd, ClientError>>,
) {
    let stream = connect(harness.addr).await.unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let console = Arc::new(MemoryConsole::new());
    let session_console: Arc<dyn Console> = console.clone();
    let username = username.to_string();
    let task =
        tokio::spawn(async move { run_client(stream, &username, rx, session_console).await });
    (tx, console, task)
}

#[tokio::test]
async fn test_chat_from_raw_peer_reaches_client() {
    // テスト項目: a chat sent by one peer is shown by another client as `alice >> hello`
    // given (前提条件):
    let harness = start_server().await;
    let (bob_input, bob_console, bob_task) = start_client(&harness, "bob").await;
    let alice = TcpStream::connect(harness.addr).await.unwrap();
    let (_alice_read, alice_write) = alice.into_split();
    let mut alice_writer = PacketWriter::new(alice_write);
    wait_for_clients(&harness.state, 2).await;

    // when (操作):
    alice_writer
        .send(&Packet::chat("alice", "hello").unwrap())
        .await
        .unwrap();

    // then (期待する結果):
    wait_for_line(&bob_console, "alice >> hello").await;
    bob_input.send("/exit".to_string()).unwrap();
    let end = timeout(WAIT, bob_task).await.unwrap().unwrap().unwrap();
    assert_eq!(end, SessionEnd::UserExit);
    wait_for_clients(&harness.state, 1).await;
}

#[tokio::test]
async fn test_two_clients_chat() {
    // テスト項目: two clients see each other's messages and their own echoed back
    // given (前提条件):
    let harness = start_server().await;
    let (alice_input, alice_console, _alice_task) = start_client(&harness, "alice").await;
    let (bob_input, bob_console, _bob_task) = start_client(&harness, "bob").await;
    wait_for_clients(&harness.state, 2).await;

    // when (操作):
    alice_input.send("hi bob".to_string()).unwrap();
    wait_for_line(&bob_console, "alice >> hi bob").await;
    bob_input.send("hi alice".to_string()).unwrap();

    // then (期待する結果):
    wait_for_line(&alice_console, "bob >> hi alice").await;
    wait_for_line(&alice_console, "alice >> hi bob").await;
    assert_eq!(harness.state.logged_messages().await, 2);
}

#[tokio::test]
async fn test_server_shutdown_ends_client_session() {
    // テスト項目: a server shutdown ends the client session with the server-closed notice
    // given (前提条件):
    let harness = start_server().await;
    let (_input, console, task) = start_client(&harness, "carol").await;
    wait_for_clients(&harness.state, 1).await;

    // when (操作):
    harness.state.shutdown().await;

    // then (期待する結果):
    let end = timeout(WAIT, task).await.unwrap().unwrap().unwrap();
    assert_eq!(end, SessionEnd::ServerShutdown);
    assert!(console.contains("SERVER >> Server closed the connection"));
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    // テスト項目: connecting where nothing listens is a connect error (exit code 5)
    // given (前提条件):
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    // when (操作):
    let result = connect(addr).await;

    // then (期待する結果):
    let err = result.unwrap_err();
    assert!(matches!(err, ClientError::Connect { .. }));
    assert_eq!(err.exit_code(), 5);
}
