//! Operator-controlled session toggles.

use std::sync::atomic::{AtomicBool, Ordering};

/// Monitor and talk mode flags, flipped from the admin console and read by
/// every connection handler.
#[derive(Debug, Default)]
pub struct SessionFlags {
    monitor: AtomicBool,
    talk: AtomicBool,
}

impl SessionFlags {
    pub fn new(monitor: bool, talk: bool) -> Self {
        Self {
            monitor: AtomicBool::new(monitor),
            talk: AtomicBool::new(talk),
        }
    }

    /// Whether internal events (packets, broadcasts, disconnects) are shown
    pub fn monitor(&self) -> bool {
        self.monitor.load(Ordering::Relaxed)
    }

    /// Whether the admin's plain lines are sent to clients as chat
    pub fn talk(&self) -> bool {
        self.talk.load(Ordering::Relaxed)
    }

    /// Flip monitor mode and return the new value
    pub fn toggle_monitor(&self) -> bool {
        !self.monitor.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flip talk mode and return the new value
    pub fn toggle_talk(&self) -> bool {
        !self.talk.fetch_xor(true, Ordering::Relaxed)
    }
}
