//! Message formatting utilities for client display.

use std::net::SocketAddr;

use fhub_shared::command::help_lines;

use crate::domain::CLIENT_COMMANDS;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Banner shown once the connection is up
    pub fn welcome() -> String {
        "<============== Connected! Welcome to the chat room! ==============>".to_string()
    }

    /// Line shown before connecting
    pub fn connecting(addr: SocketAddr, username: &str) -> String {
        format!(
            "Connecting to {} on port {} as user {}",
            addr.ip(),
            addr.port(),
            username
        )
    }

    /// Help screen for the client commands
    pub fn help() -> Vec<String> {
        let title = format!("FHUB (CLIENT) VERSION {}", env!("CARGO_PKG_VERSION"));
        help_lines(&title, CLIENT_COMMANDS)
    }

    pub fn disconnecting() -> &'static str {
        "Disconnecting..."
    }

    pub fn server_closed() -> &'static str {
        "Server closed the connection"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connecting_line() {
        // テスト項目: the connecting line names host, port and user
        // given (前提条件):
        let addr: SocketAddr = "127.0.0.1:6942".parse().unwrap();

        // when (操作):
        let line = MessageFormatter::connecting(addr, "alice");

        // then (期待する結果):
        assert_eq!(line, "Connecting to 127.0.0.1 on port 6942 as user alice");
    }

    #[test]
    fn test_help_lists_client_commands() {
        // テスト項目: the help screen carries the version title and both commands
        // given (前提条件):

        // when (操作):
        let lines = MessageFormatter::help();

        // then (期待する結果):
        assert!(lines.iter().any(|l| l.starts_with("FHUB (CLIENT) VERSION")));
        assert!(lines.iter().any(|l| l.contains("[/help]")));
        assert!(lines.iter().any(|l| l.contains("[/exit]")));
        assert!(lines.iter().any(|l| l == "THANK YOU FOR USING FHUB"));
    }
}
