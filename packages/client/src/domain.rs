//! Domain logic for client-side input.
//!
//! Pure functions deciding what a typed line means, without side effects.

use fhub_shared::command::{self, CommandError, CommandSpec};

pub const CLIENT_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "help",
        alias: "h",
        arity: 0,
        usage: "",
        summary: "prompts help output",
    },
    CommandSpec {
        name: "exit",
        alias: "e",
        arity: 0,
        usage: "",
        summary: "disconnects from the server and exits",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    Help,
    Exit,
}

/// Meaning of one typed line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Nothing to do
    Empty,
    /// Chat body to send
    Chat(String),
    Command(ClientCommand),
    /// A slash command that could not be parsed
    Invalid(CommandError),
}

/// Classify a typed line.
///
/// # Arguments
///
/// * `line` - the line as typed, without its trailing newline
pub fn parse_input(line: &str) -> Input {
    if line.trim().is_empty() {
        return Input::Empty;
    }

    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Input::Chat(line.to_string());
    };

    match command::parse(CLIENT_COMMANDS, rest) {
        Ok(invocation) => match invocation.spec.name {
            "help" => Input::Command(ClientCommand::Help),
            "exit" => Input::Command(ClientCommand::Exit),
            other => Input::Invalid(CommandError::Unknown(other.to_string())),
        },
        Err(e) => Input::Invalid(e),
    }
}
