//! UI layer: the TCP listener, connection handlers and the admin console.

pub mod admin;
pub mod handler;
pub mod server;
pub mod signal;
pub mod state;

pub use admin::AdminConsole;
pub use server::Server;
pub use state::AppState;
