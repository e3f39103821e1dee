//! Validated server configuration.

use std::{net::SocketAddr, path::PathBuf};

use fhub_shared::{
    chat_log::{DEFAULT_MAX_ENTRIES, OverflowPolicy},
    config::{DEFAULT_LISTEN_HOST, DEFAULT_PORT},
};

use crate::error::ServerError;

/// Directory the file browser is confined to when none is given
pub const DEFAULT_ROOT: &str = "ROOT";

/// Listen backlog passed to `listen(2)`
pub const LISTEN_BACKLOG: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub root: PathBuf,
    pub max_log_entries: usize,
    pub overflow: OverflowPolicy,
    /// Start with monitor mode on
    pub monitor: bool,
    /// Start with talk mode on
    pub talk: bool,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.max_log_entries == 0 {
            return Err(ServerError::InvalidConfig(
                "max log entries must be at least 1".to_string(),
            ));
        }
        if self.root.as_os_str().is_empty() {
            return Err(ServerError::InvalidConfig(
                "root directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(DEFAULT_LISTEN_HOST, DEFAULT_PORT),
            root: PathBuf::from(DEFAULT_ROOT),
            max_log_entries: DEFAULT_MAX_ENTRIES,
            overflow: OverflowPolicy::Reject,
            monitor: false,
            talk: false,
        }
    }
}
