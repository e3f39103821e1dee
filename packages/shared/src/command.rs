//! Slash-command tokenizing and table lookup.
//!
//! Both consoles accept lines such as `/create -f "my notes.txt"`. The line
//! (without its leading `/`) is split into tokens and the first token is
//! looked up in a fixed table of [`CommandSpec`]s that pins each command's
//! exact argument count.
//!
//! Tokenizing rules:
//!
//! - unquoted whitespace ends a token;
//! - `"` toggles quote mode and is dropped from the token;
//! - segments with no whitespace between them join, so `a"b c"d` is `ab cd`;
//! - `""` produces an empty token;
//! - an unmatched `"` leaves quote mode on until the end of the line, so
//!   `read "my file` yields `["read", "my file"]`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Invalid command: /{0}")]
    Unknown(String),

    #[error("received {received} arguments, should've received {expected}")]
    Arity {
        command: &'static str,
        expected: usize,
        received: usize,
    },

    #[error("invalid flag '{flag}' for /{command}, expected one of {expected}")]
    InvalidFlag {
        command: &'static str,
        flag: String,
        expected: &'static str,
    },
}

/// One entry of a console's fixed command table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub alias: &'static str,
    /// Exact number of arguments, not counting the command token
    pub arity: usize,
    /// Argument synopsis shown in help, e.g. `<-f|-d> <name>`
    pub usage: &'static str,
    pub summary: &'static str,
}

/// A command line matched against its table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub spec: CommandSpec,
    pub args: Vec<String>,
}

/// Split a command line into tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Tokenize `line` (without its leading `/`) and match it against `table`.
///
/// The first token matches a table entry by its name or alias. Arity is checked
/// exactly.
pub fn parse(table: &[CommandSpec], line: &str) -> Result<Invocation, CommandError> {
    let mut tokens = tokenize(line).into_iter();
    let name = tokens.next().ok_or(CommandError::Empty)?;
    let spec = table
        .iter()
        .find(|spec| spec.name == name || spec.alias == name)
        .copied()
        .ok_or_else(|| CommandError::Unknown(name.clone()))?;

    let args: Vec<String> = tokens.collect();
    if args.len() != spec.arity {
        return Err(CommandError::Arity {
            command: spec.name,
            expected: spec.arity,
            received: args.len(),
        });
    }

    Ok(Invocation { spec, args })
}

/// Help screen for a command table.
pub fn help_lines(title: &str, table: &[CommandSpec]) -> Vec<String> {
    let mut lines = vec![String::new(), title.to_string(), String::new(), "COMMANDS:".to_string()];
    for spec in table {
        let command = if spec.usage.is_empty() {
            format!("[/{}]", spec.name)
        } else {
            format!("[/{} {}]", spec.name, spec.usage)
        };
        lines.push(format!(
            "\t- {:<26} {:<6} {}",
            command,
            format!("[/{}]", spec.alias),
            spec.summary
        ));
    }
    lines.push(String::new());
    lines.push("THANK YOU FOR USING FHUB".to_string());
    lines.push(String::new());
    lines
}
