//! FHUB chat client library.
//!
//! The client mirrors the chat room: an inbound task prints every relayed
//! line while an outbound task turns typed lines into chat packets.

pub mod config;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod runner;
pub mod session;
