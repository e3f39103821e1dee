//! Use cases of the chat server.

mod connect_client;
mod disconnect_client;
mod error;
mod relay_chat;

pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use error::RelayError;
pub use relay_chat::{RelayChatUseCase, RelayReport};
