//! UseCase: relaying a chat line (the broadcaster)
//!
//! A relay appends the rendered line to the chat log and queues the encoded
//! packet on every registered connection. The log lock is held from the
//! append until the last frame is queued, so all recipients observe packets
//! in log-index order. Queueing never blocks; the socket writes happen in
//! each connection's writer task, outside any lock.
//!
//! Lock order: chat log, then registry.

use std::sync::Arc;

use bytes::Bytes;
use fhub_shared::{
    chat_log::ChatLog,
    packet::{ChatPacket, Packet},
    time::Clock,
};
use tokio::sync::Mutex;

use crate::domain::{ClientId, ClientRegistry};

use super::error::RelayError;

/// Outcome of one relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReport {
    /// Chat log index of the relayed line
    pub index: usize,
    /// Number of connections the frame was queued on
    pub delivered: usize,
    /// Connections found closed and unregistered during the broadcast
    pub dropped: Vec<ClientId>,
}

pub struct RelayChatUseCase {
    log: Arc<Mutex<ChatLog>>,
    registry: Arc<Mutex<ClientRegistry>>,
    clock: Arc<dyn Clock>,
}

impl RelayChatUseCase {
    pub fn new(
        log: Arc<Mutex<ChatLog>>,
        registry: Arc<Mutex<ClientRegistry>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            log,
            registry,
            clock,
        }
    }

    /// Log the chat and broadcast it to every client except `exclude`.
    ///
    /// When the log refuses the entry nothing is broadcast.
    pub async fn execute(
        &self,
        chat: &ChatPacket,
        exclude: Option<ClientId>,
    ) -> Result<RelayReport, RelayError> {
        let frame = Packet::Chat(chat.clone()).encode();

        let mut log = self.log.lock().await;
        let index = log.append(chat.render(), self.clock.now_millis())?;
        let mut registry = self.registry.lock().await;
        let (delivered, dropped) = fan_out(&mut registry, frame, exclude);
        drop(registry);
        drop(log);

        tracing::debug!(
            "Relayed #{} from '{}' to {} client(s)",
            index,
            chat.sender(),
            delivered
        );
        Ok(RelayReport {
            index,
            delivered,
            dropped,
        })
    }

    /// Close the registry and queue a `Shutdown` packet on every member.
    ///
    /// Nothing is logged. A client registering afterwards is refused, so no
    /// one is left without the notice. Returns the number of clients notified.
    pub async fn notify_shutdown(&self) -> usize {
        // Taken so the shutdown lands after any relay already in progress
        let _log = self.log.lock().await;
        let mut registry = self.registry.lock().await;
        registry.close();
        let (delivered, _) = fan_out(&mut registry, Packet::Shutdown.encode(), None);
        delivered
    }
}

/// Push `frame` to every member except `exclude`, unregistering the ones
/// that cannot take it.
fn fan_out(
    registry: &mut ClientRegistry,
    frame: Bytes,
    exclude: Option<ClientId>,
) -> (usize, Vec<ClientId>) {
    let mut delivered = 0;
    let mut dropped = Vec::new();

    for handle in registry.snapshot() {
        if Some(handle.id()) == exclude {
            continue;
        }
        match handle.push(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(e) => {
                tracing::warn!("Broadcast skipped {}: {}", handle.peer(), e);
                dropped.push(handle.id());
            }
        }
    }

    for id in &dropped {
        registry.unregister(id);
    }
    (delivered, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClientHandle, ClientIdFactory, OUTBOX_CAPACITY, RegistryError};
    use fhub_shared::{
        chat_log::{ChatLogError, OverflowPolicy},
        time::FixedClock,
    };
    use tokio::sync::mpsc;

    struct Fixture {
        log: Arc<Mutex<ChatLog>>,
        registry: Arc<Mutex<ClientRegistry>>,
        usecase: Arc<RelayChatUseCase>,
    }

    fn create_fixture(max_entries: usize) -> Fixture {
        let log = Arc::new(Mutex::new(ChatLog::new(max_entries, OverflowPolicy::Reject)));
        let registry = Arc::new(Mutex::new(ClientRegistry::new()));
        let usecase = Arc::new(RelayChatUseCase::new(
            log.clone(),
            registry.clone(),
            Arc::new(FixedClock::new(1_700_000_000_000)),
        ));
        Fixture {
            log,
            registry,
            usecase,
        }
    }

    async fn add_client(
        registry: &Arc<Mutex<ClientRegistry>>,
    ) -> (ClientId, mpsc::Receiver<Bytes>) {
        add_client_with_capacity(registry, OUTBOX_CAPACITY).await
    }

    async fn add_client_with_capacity(
        registry: &Arc<Mutex<ClientRegistry>>,
        capacity: usize,
    ) -> (ClientId, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity);
        let handle = ClientHandle::new(
            ClientIdFactory::generate(),
            "127.0.0.1:40100".parse().unwrap(),
            tx,
        );
        let id = registry.lock().await.register(handle).unwrap();
        (id, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<Bytes>) -> Vec<Bytes> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    #[tokio::test]
    async fn test_relay_appends_and_broadcasts() {
        // テスト項目: a relay logs the rendered line and queues the packet for every client
        // given (前提条件):
        let fixture = create_fixture(10);
        let (_, mut rx1) = add_client(&fixture.registry).await;
        let (_, mut rx2) = add_client(&fixture.registry).await;
        let chat = ChatPacket::new("alice", "hello").unwrap();

        // when (操作):
        let report = fixture.usecase.execute(&chat, None).await.unwrap();

        // then (期待する結果):
        assert_eq!(report.index, 0);
        assert_eq!(report.delivered, 2);
        assert!(report.dropped.is_empty());
        assert_eq!(fixture.log.lock().await.get(0).unwrap().line, "alice >> hello");
        assert_eq!(drain(&mut rx1), vec![Bytes::from_static(b"calice>hello")]);
        assert_eq!(drain(&mut rx2), vec![Bytes::from_static(b"calice>hello")]);
    }

    #[tokio::test]
    async fn test_broadcast_isolates_failed_client() {
        // テスト項目: one closed connection does not stop delivery to the others and is unregistered
        // given (前提条件):
        let fixture = create_fixture(10);
        let (id1, mut rx1) = add_client(&fixture.registry).await;
        let (id2, rx2) = add_client(&fixture.registry).await;
        let (id3, mut rx3) = add_client(&fixture.registry).await;
        drop(rx2);
        let chat = ChatPacket::new("bob", "still here?").unwrap();

        // when (操作):
        let report = fixture.usecase.execute(&chat, None).await.unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 2);
        assert_eq!(report.dropped, vec![id2]);
        assert_eq!(drain(&mut rx1).len(), 1);
        assert_eq!(drain(&mut rx3).len(), 1);
        let registry = fixture.registry.lock().await;
        assert!(registry.contains(&id1));
        assert!(!registry.contains(&id2));
        assert!(registry.contains(&id3));
    }

    #[tokio::test]
    async fn test_broadcast_drops_client_that_stopped_reading() {
        // テスト項目: a client whose queue is full is unregistered and the others still receive
        // given (前提条件):
        let fixture = create_fixture(10);
        let (slow, mut slow_rx) = add_client_with_capacity(&fixture.registry, 1).await;
        let (fast, mut fast_rx) = add_client(&fixture.registry).await;
        let first = ChatPacket::new("alice", "one").unwrap();
        let second = ChatPacket::new("alice", "two").unwrap();
        fixture.usecase.execute(&first, None).await.unwrap();

        // when (操作):
        let report = fixture.usecase.execute(&second, None).await.unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, vec![slow]);
        assert_eq!(drain(&mut slow_rx), vec![Bytes::from_static(b"calice>one")]);
        assert_eq!(drain(&mut fast_rx).len(), 2);
        let registry = fixture.registry.lock().await;
        assert!(!registry.contains(&slow));
        assert!(registry.contains(&fast));
    }

    #[tokio::test]
    async fn test_relay_skips_excluded_client() {
        // テスト項目: the excluded client receives nothing
        // given (前提条件):
        let fixture = create_fixture(10);
        let (sender, mut sender_rx) = add_client(&fixture.registry).await;
        let (_, mut other_rx) = add_client(&fixture.registry).await;
        let chat = ChatPacket::new("carol", "hi").unwrap();

        // when (操作):
        let report = fixture.usecase.execute(&chat, Some(sender)).await.unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert!(drain(&mut sender_rx).is_empty());
        assert_eq!(drain(&mut other_rx).len(), 1);
    }

    #[tokio::test]
    async fn test_full_log_rejects_without_broadcast() {
        // テスト項目: when the log is full the relay fails and nothing is sent
        // given (前提条件):
        let fixture = create_fixture(1);
        let (_, mut rx) = add_client(&fixture.registry).await;
        let first = ChatPacket::new("alice", "one").unwrap();
        let second = ChatPacket::new("alice", "two").unwrap();
        fixture.usecase.execute(&first, None).await.unwrap();

        // when (操作):
        let result = fixture.usecase.execute(&second, None).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RelayError::Log(ChatLogError::CapacityExceeded { max: 1 }))
        );
        assert_eq!(drain(&mut rx), vec![Bytes::from_static(b"calice>one")]);
        assert_eq!(fixture.log.lock().await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_relays_keep_log_order() {
        // テスト項目: concurrent relays reach every client in the same order as the log indexes
        // given (前提条件):
        let fixture = create_fixture(1000);
        let (_, mut rx1) = add_client(&fixture.registry).await;
        let (_, mut rx2) = add_client(&fixture.registry).await;

        // when (操作):
        let mut tasks = Vec::new();
        for sender in 0..4 {
            let usecase = fixture.usecase.clone();
            tasks.push(tokio::spawn(async move {
                for n in 0..25 {
                    let chat = ChatPacket::new(format!("user{sender}"), format!("msg{n}")).unwrap();
                    usecase.execute(&chat, None).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // then (期待する結果):
        let frames1 = drain(&mut rx1);
        let frames2 = drain(&mut rx2);
        assert_eq!(frames1.len(), 100);
        assert_eq!(frames1, frames2);

        let log = fixture.log.lock().await;
        for (index, frame) in frames1.iter().enumerate() {
            let Packet::Chat(chat) = Packet::decode(frame).unwrap() else {
                panic!("expected chat packet");
            };
            assert_eq!(log.get(index).unwrap().line, chat.render());
        }
    }

    #[tokio::test]
    async fn test_notify_shutdown_is_not_logged() {
        // テスト項目: the shutdown notice reaches every client without touching the log
        // given (前提条件):
        let fixture = create_fixture(10);
        let (_, mut rx1) = add_client(&fixture.registry).await;
        let (_, mut rx2) = add_client(&fixture.registry).await;

        // when (操作):
        let notified = fixture.usecase.notify_shutdown().await;

        // then (期待する結果):
        assert_eq!(notified, 2);
        assert_eq!(drain(&mut rx1), vec![Bytes::from_static(b"s")]);
        assert_eq!(drain(&mut rx2), vec![Bytes::from_static(b"s")]);
        assert!(fixture.log.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_notify_shutdown_closes_registry() {
        // テスト項目: after the shutdown notice no new client can register
        // given (前提条件):
        let fixture = create_fixture(10);
        fixture.usecase.notify_shutdown().await;

        // when (操作):
        let (tx, _rx) = mpsc::channel(OUTBOX_CAPACITY);
        let handle = ClientHandle::new(
            ClientIdFactory::generate(),
            "127.0.0.1:40101".parse().unwrap(),
            tx,
        );
        let result = fixture.registry.lock().await.register(handle);

        // then (期待する結果):
        assert_eq!(result, Err(RegistryError::Closed));
    }
}
