//! Admin console command table.

use fhub_shared::command::{self, CommandError, CommandSpec, Invocation};

use crate::domain::EntryKind;

pub const ADMIN_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "help",
        alias: "h",
        arity: 0,
        usage: "",
        summary: "prompts help output",
    },
    CommandSpec {
        name: "monitor",
        alias: "m",
        arity: 0,
        usage: "",
        summary: "toggles monitoring log on or off",
    },
    CommandSpec {
        name: "exit",
        alias: "e",
        arity: 0,
        usage: "",
        summary: "shuts down the application and disconnects all clients",
    },
    CommandSpec {
        name: "list",
        alias: "l",
        arity: 0,
        usage: "",
        summary: "lists all files in the current directory",
    },
    CommandSpec {
        name: "talk",
        alias: "t",
        arity: 0,
        usage: "",
        summary: "toggles sending typed lines to clients",
    },
    CommandSpec {
        name: "read",
        alias: "r",
        arity: 1,
        usage: "<file>",
        summary: "prints a file in the current directory",
    },
    CommandSpec {
        name: "create",
        alias: "c",
        arity: 2,
        usage: "<-f|-d> <name>",
        summary: "creates a file (-f) or directory (-d)",
    },
    CommandSpec {
        name: "changedir",
        alias: "cd",
        arity: 1,
        usage: "<path>",
        summary: "changes the current directory",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Help,
    Monitor,
    Exit,
    List,
    Talk,
    Read(String),
    Create(EntryKind, String),
    ChangeDir(String),
}

impl AdminCommand {
    /// Parse a command line without its leading `/`
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let Invocation { spec, args } = command::parse(ADMIN_COMMANDS, line)?;
        let mut args = args.into_iter();
        let mut next_arg = || args.next().unwrap_or_default();

        let parsed = match spec.name {
            "help" => AdminCommand::Help,
            "monitor" => AdminCommand::Monitor,
            "exit" => AdminCommand::Exit,
            "list" => AdminCommand::List,
            "talk" => AdminCommand::Talk,
            "read" => AdminCommand::Read(next_arg()),
            "create" => {
                let flag = next_arg();
                let name = next_arg();
                let kind = EntryKind::from_flag(&flag).ok_or(CommandError::InvalidFlag {
                    command: spec.name,
                    flag,
                    expected: "-f, -d",
                })?;
                AdminCommand::Create(kind, name)
            }
            "changedir" => AdminCommand::ChangeDir(next_arg()),
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(parsed)
    }
}
