//! Validated client configuration.

use std::net::SocketAddr;

use fhub_shared::config::{DEFAULT_CONNECT_HOST, DEFAULT_PORT, DEFAULT_USERNAME, parse_username};

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub addr: SocketAddr,
    pub username: String,
}

impl ClientConfig {
    /// Build a configuration, rejecting usernames the wire format cannot carry.
    pub fn new(addr: SocketAddr, username: &str) -> Result<Self, ClientError> {
        let username = parse_username(username).map_err(ClientError::InvalidConfig)?;
        Ok(Self { addr, username })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(DEFAULT_CONNECT_HOST, DEFAULT_PORT),
            username: DEFAULT_USERNAME.to_string(),
        }
    }
}
