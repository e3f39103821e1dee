//! Shared server state.

use std::sync::Arc;

use fhub_shared::{
    chat_log::ChatLog,
    console::{Console, ConsoleLine},
    time::{Clock, format_clock_time},
};
use tokio::sync::Mutex;

use crate::{
    config::ServerConfig,
    domain::{ClientRegistry, SessionFlags},
    usecase::{ConnectClientUseCase, DisconnectClientUseCase, RelayChatUseCase},
};

use super::signal::{Shutdown, ShutdownListener};

/// State shared by the accept loop, every connection handler and the admin
/// console
pub struct AppState {
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    pub relay_chat_usecase: Arc<RelayChatUseCase>,
    pub session: SessionFlags,
    console: Arc<dyn Console>,
    clock: Arc<dyn Clock>,
    registry: Arc<Mutex<ClientRegistry>>,
    log: Arc<Mutex<ChatLog>>,
    shutdown: Shutdown,
}

impl AppState {
    /// Wire up the chat log, the registry and the use cases for `config`.
    pub fn new(config: &ServerConfig, console: Arc<dyn Console>, clock: Arc<dyn Clock>) -> Self {
        // 1. Shared state
        let log = Arc::new(Mutex::new(ChatLog::new(
            config.max_log_entries,
            config.overflow,
        )));
        let registry = Arc::new(Mutex::new(ClientRegistry::new()));

        // 2. UseCases
        let connect_client_usecase = Arc::new(ConnectClientUseCase::new(registry.clone()));
        let disconnect_client_usecase = Arc::new(DisconnectClientUseCase::new(registry.clone()));
        let relay_chat_usecase = Arc::new(RelayChatUseCase::new(
            log.clone(),
            registry.clone(),
            clock.clone(),
        ));

        Self {
            connect_client_usecase,
            disconnect_client_usecase,
            relay_chat_usecase,
            session: SessionFlags::new(config.monitor, config.talk),
            console,
            clock,
            registry,
            log,
            shutdown: Shutdown::new(),
        }
    }

    pub fn emit(&self, line: ConsoleLine) {
        self.console.emit(line);
    }

    /// Show an internal event, only while monitor mode is on
    pub fn monitor(&self, text: impl AsRef<str>) {
        if self.session.monitor() {
            let time = format_clock_time(self.clock.now_millis());
            self.console
                .emit(ConsoleLine::monitor(format!("[{}] {}", time, text.as_ref())));
        }
    }

    pub fn shutdown_listener(&self) -> ShutdownListener {
        self.shutdown.subscribe()
    }

    /// Start the global shutdown.
    ///
    /// Every registered client gets a `Shutdown` packet queued before the
    /// flag flips, so handlers drain it before closing. The registry is
    /// closed in the same step, so a connection accepted meanwhile is turned
    /// away with its own notice. Only the first call does anything, even when
    /// calls overlap.
    pub async fn shutdown(&self) {
        if !self.shutdown.begin() {
            return;
        }
        self.emit(ConsoleLine::server("Shutting down..."));
        let notified = self.relay_chat_usecase.notify_shutdown().await;
        tracing::info!("Shutdown notice queued for {} client(s)", notified);
        self.shutdown.trigger();
    }

    pub async fn connected_clients(&self) -> usize {
        self.registry.lock().await.len()
    }

    pub async fn logged_messages(&self) -> usize {
        self.log.lock().await.len()
    }
}
