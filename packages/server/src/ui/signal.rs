//! Global shutdown flag.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Owner side of the shutdown flag. Flipping it is one-way.
///
/// Shutdown runs in two steps: [`Shutdown::begin`] claims it (exactly one
/// caller wins), then [`Shutdown::trigger`] wakes the listeners.
#[derive(Debug)]
pub struct Shutdown {
    started: AtomicBool,
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            started: AtomicBool::new(false),
            tx,
        }
    }

    /// Claim the shutdown. Only the first caller gets `true`.
    pub fn begin(&self) -> bool {
        !self.started.swap(true, Ordering::AcqRel)
    }

    /// Raise the flag. Returns `false` if it was already raised.
    pub fn trigger(&self) -> bool {
        self.tx.send_if_modified(|raised| {
            if *raised {
                false
            } else {
                *raised = true;
                true
            }
        })
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of the shutdown flag, one per task.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Resolve once the flag is raised. Cancel safe.
    pub async fn wait(&mut self) {
        // A dropped sender means the server state is gone; treat it as shutdown.
        let _ = self.rx.wait_for(|raised| *raised).await;
    }
}

/// Resolve on Ctrl+C delivered as a signal (i.e. when stdin is not a
/// terminal in raw mode).
pub async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
