//! Admin console: the operator's command loop.
//!
//! Lines starting with `/` are commands. Any other line is sent to every
//! client as `ADMIN` chat while talk mode is on.

mod command;

use std::{ops::ControlFlow, sync::Arc};

use fhub_shared::{
    command::help_lines,
    console::{ConsoleLine, Tone},
    packet::ChatPacket,
};
use tokio::sync::mpsc;

use crate::domain::{EntryKind, FileBrowser, Listing};

use super::state::AppState;

pub use command::{ADMIN_COMMANDS, AdminCommand};

/// Sender name of chat typed on the admin console
pub const ADMIN_SENDER: &str = "ADMIN";

pub struct AdminConsole {
    state: Arc<AppState>,
    browser: Arc<dyn FileBrowser>,
}

impl AdminConsole {
    pub fn new(state: Arc<AppState>, browser: Arc<dyn FileBrowser>) -> Self {
        Self { state, browser }
    }

    /// Process operator lines until `/exit`, end of input or shutdown.
    ///
    /// End of input (Ctrl+C, Ctrl+D) starts the global shutdown.
    pub async fn run(self, mut lines: mpsc::UnboundedReceiver<String>) {
        let mut shutdown = self.state.shutdown_listener();
        loop {
            tokio::select! {
                line = lines.recv() => match line {
                    Some(line) => {
                        if self.handle_line(&line).await.is_break() {
                            break;
                        }
                    }
                    None => {
                        tracing::info!("Operator input closed");
                        self.state.shutdown().await;
                        break;
                    }
                },
                _ = shutdown.wait() => break,
            }
        }
        tracing::debug!("Admin console stopped");
    }

    /// Handle one operator line. `Break` means the server is shutting down.
    pub async fn handle_line(&self, line: &str) -> ControlFlow<()> {
        let line = line.trim();
        if line.is_empty() {
            return ControlFlow::Continue(());
        }

        if let Some(command) = line.strip_prefix('/') {
            self.state.emit(ConsoleLine::admin(line));
            match AdminCommand::parse(command) {
                Ok(command) => return self.execute(command).await,
                Err(e) => self.state.emit(ConsoleLine::error(e.to_string())),
            }
        } else if self.state.session.talk() {
            self.talk(line).await;
        } else {
            self.state.emit(ConsoleLine::server(
                "Talk mode is OFF. Type /talk to chat with clients or /help for commands",
            ));
        }
        ControlFlow::Continue(())
    }

    async fn execute(&self, command: AdminCommand) -> ControlFlow<()> {
        tracing::debug!("Admin command: {:?}", command);
        match command {
            AdminCommand::Help => {
                let title = format!("FHUB (SERVER) VERSION {}", env!("CARGO_PKG_VERSION"));
                for line in help_lines(&title, ADMIN_COMMANDS) {
                    self.state.emit(ConsoleLine::plain(line));
                }
            }
            AdminCommand::Monitor => {
                let on = self.state.session.toggle_monitor();
                self.state
                    .emit(ConsoleLine::server(format!("monitoring toggled {}", on_off(on))));
            }
            AdminCommand::Talk => {
                let on = self.state.session.toggle_talk();
                self.state
                    .emit(ConsoleLine::server(format!("talk mode toggled {}", on_off(on))));
            }
            AdminCommand::Exit => {
                self.state.shutdown().await;
                return ControlFlow::Break(());
            }
            AdminCommand::List => match self.browser.list().await {
                Ok(listing) => self.show_listing(listing),
                Err(e) => self.state.emit(ConsoleLine::error(e.to_string())),
            },
            AdminCommand::Read(name) => match self.browser.read(&name).await {
                Ok(content) => {
                    for line in content.lines() {
                        self.state.emit(ConsoleLine::plain(line));
                    }
                }
                Err(e) => self.state.emit(ConsoleLine::error(e.to_string())),
            },
            AdminCommand::Create(kind, name) => match self.browser.create(kind, &name).await {
                Ok(shown) => {
                    let noun = match kind {
                        EntryKind::File => "file",
                        EntryKind::Directory => "directory",
                    };
                    self.state
                        .emit(ConsoleLine::server(format!("Created {} {}", noun, shown)));
                }
                Err(e) => self.state.emit(ConsoleLine::error(e.to_string())),
            },
            AdminCommand::ChangeDir(path) => match self.browser.change_dir(&path).await {
                Ok(shown) => self
                    .state
                    .emit(ConsoleLine::server(format!("Current directory: {}/", shown))),
                Err(e) => self.state.emit(ConsoleLine::error(e.to_string())),
            },
        }
        ControlFlow::Continue(())
    }

    fn show_listing(&self, listing: Listing) {
        if listing.created_root {
            self.state.emit(ConsoleLine::server(
                "No root directory detected. Creating a new directory...",
            ));
            self.state
                .emit(ConsoleLine::server("Root directory created!"));
        }

        self.state.emit(ConsoleLine::plain(""));
        self.state
            .emit(ConsoleLine::plain(format!("DIRECTORY: {}/", listing.path)));
        self.state.emit(ConsoleLine::plain(""));
        for entry in listing.entries {
            match entry.kind {
                EntryKind::Directory => self
                    .state
                    .emit(ConsoleLine::new(Tone::Emphasis, format!("{}/", entry.name))),
                EntryKind::File => self.state.emit(ConsoleLine::plain(entry.name)),
            }
        }
        self.state.emit(ConsoleLine::plain(""));
    }

    async fn talk(&self, line: &str) {
        let chat = match ChatPacket::new(ADMIN_SENDER, line) {
            Ok(chat) => chat,
            Err(e) => {
                self.state.emit(ConsoleLine::error(e.to_string()));
                return;
            }
        };

        match self.state.relay_chat_usecase.execute(&chat, None).await {
            Ok(report) => {
                self.state.emit(ConsoleLine::chat(chat.render()));
                self.state.monitor(format!(
                    "updating client chatrooms (#{} to {} client(s))",
                    report.index, report.delivered
                ));
            }
            Err(e) => {
                tracing::error!("Admin chat not relayed: {}", e);
                self.state.emit(ConsoleLine::error(e.to_string()));
            }
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}
