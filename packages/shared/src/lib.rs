//! Shared building blocks for the FHUB chat server and client.
//!
//! Everything both binaries speak or print lives here: the packet codec and
//! its stream framing, the append-only chat log, the slash-command tokenizer,
//! the console hook and the startup configuration helpers.

pub mod chat_log;
pub mod command;
pub mod config;
pub mod console;
pub mod frame;
pub mod logger;
pub mod packet;
pub mod time;
