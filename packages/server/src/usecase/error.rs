//! Use case errors.

use fhub_shared::chat_log::ChatLogError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The chat log refused the entry; nothing was broadcast
    #[error(transparent)]
    Log(#[from] ChatLogError),
}
