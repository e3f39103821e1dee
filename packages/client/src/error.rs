//! Error types for the chat client.

use std::{io, net::SocketAddr};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to start the async runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Socket creation error: {0}")]
    SocketCreate(#[source] io::Error),

    #[error("Connection to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The server went away without a shutdown notice
    #[error("Connection lost: {0}")]
    ConnectionLost(String),
}

impl ClientError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            ClientError::Runtime(_) | ClientError::ConnectionLost(_) => 1,
            ClientError::InvalidConfig(_) => 3,
            ClientError::SocketCreate(_) => 4,
            ClientError::Connect { .. } => 5,
        }
    }
}
