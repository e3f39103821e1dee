//! Connection handlers.

mod tcp;

pub use tcp::{ConnectionState, DisconnectReason, handle_connection};
