//! Startup configuration helpers shared by both binaries.

use std::net::{IpAddr, Ipv4Addr};

use crate::packet::SENDER_DELIMITER;

/// Port used when none (or a reserved one) is given
pub const DEFAULT_PORT: u16 = 6942;

/// Ports at or below this value are refused and replaced with [`DEFAULT_PORT`]
pub const HIGHEST_RESERVED_PORT: u16 = 1024;

/// Address the client connects to by default
pub const DEFAULT_CONNECT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Address the server listens on by default
pub const DEFAULT_LISTEN_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Display name used when the user does not pick one
pub const DEFAULT_USERNAME: &str = "ANONYMOUS";

/// Outcome of validating a requested port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortChoice {
    Accepted(u16),
    /// The requested port was reserved; the default is used instead
    Defaulted { requested: u16, port: u16 },
}

impl PortChoice {
    pub fn port(self) -> u16 {
        match self {
            PortChoice::Accepted(port) => port,
            PortChoice::Defaulted { port, .. } => port,
        }
    }

    /// Operator-facing warning for a defaulted port
    pub fn warning(self) -> Option<String> {
        match self {
            PortChoice::Accepted(_) => None,
            PortChoice::Defaulted { port, .. } => Some(format!(
                "Indicated port is either invalid or reserved. Defaulting to {port}"
            )),
        }
    }
}

/// Apply the reserved-port policy.
pub fn resolve_port(requested: u16) -> PortChoice {
    if requested <= HIGHEST_RESERVED_PORT {
        PortChoice::Defaulted {
            requested,
            port: DEFAULT_PORT,
        }
    } else {
        PortChoice::Accepted(requested)
    }
}

/// Validate a display name; usable directly as a clap `value_parser`.
///
/// Names must not be blank and must not contain the `>` wire delimiter.
pub fn parse_username(input: &str) -> Result<String, String> {
    let name = input.trim();
    if name.is_empty() {
        return Err("username must not be blank".to_string());
    }
    if name.as_bytes().contains(&SENDER_DELIMITER) {
        return Err(format!(
            "username must not contain '{}'",
            SENDER_DELIMITER as char
        ));
    }
    Ok(name.to_string())
}
