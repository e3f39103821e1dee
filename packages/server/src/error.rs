//! Fatal server errors and their process exit codes.

use std::{io, net::SocketAddr};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to start the async runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to create socket: {0}")]
    SocketCreate(#[source] io::Error),

    #[error("Failed to set socket option: {0}")]
    SocketOption(#[source] io::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Failed to listen: {0}")]
    Listen(#[source] io::Error),
}

impl ServerError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            ServerError::Runtime(_) => 1,
            ServerError::InvalidConfig(_) => 3,
            ServerError::SocketCreate(_) => 4,
            ServerError::SocketOption(_) => 5,
            ServerError::Bind { .. } => 6,
            ServerError::Listen(_) => 7,
        }
    }
}
