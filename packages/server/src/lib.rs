//! FHUB chat server library.
//!
//! Layers, from the inside out:
//!
//! - `domain`: client handles, the client registry, session flags and the
//!   file-browser seam
//! - `usecase`: connecting, disconnecting and relaying chat (the broadcaster)
//! - `infrastructure`: the per-connection outbound writer and the sandboxed
//!   local file browser
//! - `ui`: the TCP listener, connection handlers and the admin console

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
