//! Domain layer: the server's connection bookkeeping and the collaborator
//! interfaces it relies on.

mod browser;
mod client;
mod registry;
mod session;

pub use browser::{BrowseError, DirEntry, EntryKind, FileBrowser, Listing};
#[cfg(test)]
pub use browser::MockFileBrowser;
pub use client::{ClientHandle, ClientId, ClientIdFactory, OUTBOX_CAPACITY, Outbox, PushError};
pub use registry::{ClientRegistry, RegistryError};
pub use session::SessionFlags;
