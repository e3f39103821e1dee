//! Operator-facing console output and line input.
//!
//! Everything a user should see goes through [`Console::emit`] as a tagged
//! [`ConsoleLine`], so errors are always distinguishable from chat. Internal
//! diagnostics go to `tracing` instead.
//!
//! Input is read by rustyline on a dedicated OS thread (see
//! [`spawn_line_reader`]). Output printed while the user is typing goes
//! through rustyline's external printer, which erases the partial input,
//! prints the line and redraws the prompt with the partial input intact.

use std::sync::{Mutex, PoisonError};

use rustyline::{DefaultEditor, ExternalPrinter, error::ReadlineError};
use tokio::sync::mpsc;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Category of a console line; decides its prefix and color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// A rendered chat line, printed verbatim
    Chat,
    /// Free text such as help screens and file contents
    Plain,
    /// Free text printed in bold (directories in listings)
    Emphasis,
    Server,
    Admin,
    Monitor,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub tone: Tone,
    pub text: String,
}

impl ConsoleLine {
    pub fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }

    pub fn chat(text: impl Into<String>) -> Self {
        Self::new(Tone::Chat, text)
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(Tone::Plain, text)
    }

    pub fn server(text: impl Into<String>) -> Self {
        Self::new(Tone::Server, text)
    }

    pub fn admin(text: impl Into<String>) -> Self {
        Self::new(Tone::Admin, text)
    }

    pub fn monitor(text: impl Into<String>) -> Self {
        Self::new(Tone::Monitor, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Tone::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Tone::Error, text)
    }

    /// Uncolored display form, e.g. `ERROR >> bind failed`
    pub fn render(&self) -> String {
        match self.tone {
            Tone::Chat | Tone::Plain | Tone::Emphasis => self.text.clone(),
            Tone::Server => format!("SERVER >> {}", self.text),
            Tone::Admin => format!("ADMIN >> {}", self.text),
            Tone::Monitor => format!("MONITOR >> {}", self.text),
            Tone::Warning => format!("WARNING: {}", self.text),
            Tone::Error => format!("ERROR >> {}", self.text),
        }
    }

    /// Display form wrapped in ANSI color codes
    pub fn styled(&self) -> String {
        let color = match self.tone {
            Tone::Chat | Tone::Plain | Tone::Admin => return self.render(),
            Tone::Emphasis => BOLD,
            Tone::Monitor => GREEN,
            Tone::Server | Tone::Warning => YELLOW,
            Tone::Error => RED,
        };
        format!("{}{}{}", color, self.render(), RESET)
    }
}

/// Sink for user-visible lines
pub trait Console: Send + Sync {
    fn emit(&self, line: ConsoleLine);
}

/// Console printing to the terminal, around any in-progress rustyline input
pub struct TerminalConsole {
    printer: Mutex<Option<Box<dyn ExternalPrinter + Send>>>,
}

impl TerminalConsole {
    /// Console that writes straight to stdout
    pub fn stdout() -> Self {
        Self {
            printer: Mutex::new(None),
        }
    }

    fn with_printer(printer: Option<Box<dyn ExternalPrinter + Send>>) -> Self {
        Self {
            printer: Mutex::new(printer),
        }
    }
}

impl Console for TerminalConsole {
    fn emit(&self, line: ConsoleLine) {
        let text = line.styled();
        let mut printer = self.printer.lock().unwrap_or_else(PoisonError::into_inner);
        match printer.as_mut() {
            Some(printer) => {
                if let Err(e) = printer.print(text.clone()) {
                    tracing::debug!("External printer failed, falling back to stdout: {}", e);
                    println!("{}", text);
                }
            }
            None => println!("{}", text),
        }
    }
}

/// Console that records lines in memory
#[derive(Debug, Default)]
pub struct MemoryConsole {
    lines: Mutex<Vec<ConsoleLine>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rendered (uncolored) form of every recorded line
    pub fn rendered(&self) -> Vec<String> {
        self.lines().iter().map(ConsoleLine::render).collect()
    }

    /// Whether any rendered line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.rendered().iter().any(|line| line.contains(needle))
    }
}

impl Console for MemoryConsole {
    fn emit(&self, line: ConsoleLine) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }
}

/// Start reading lines from the terminal on a dedicated thread.
///
/// Returns the receiving end of the line channel and a console that prints
/// around the prompt. The channel closes on Ctrl+C, Ctrl+D or a terminal
/// error, which callers treat as the user leaving.
pub fn spawn_line_reader(prompt: String) -> (mpsc::UnboundedReceiver<String>, TerminalConsole) {
    let (line_tx, line_rx) = mpsc::unbounded_channel::<String>();
    let (printer_tx, printer_rx) = std::sync::mpsc::channel();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                let _ = printer_tx.send(None);
                return;
            }
        };

        let printer = match rl.create_external_printer() {
            Ok(printer) => Some(Box::new(printer) as Box<dyn ExternalPrinter + Send>),
            Err(e) => {
                tracing::debug!("External printer unavailable: {}", e);
                None
            }
        };
        let _ = printer_tx.send(printer);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim_end();
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line).ok();
                    if line_tx.send(line.to_string()).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let printer = printer_rx.recv().ok().flatten();
    (line_rx, TerminalConsole::with_printer(printer))
}
