//! Infrastructure layer: socket writers and the local filesystem.

pub mod file_browser;
pub mod pusher;

pub use file_browser::LocalFileBrowser;
pub use pusher::pusher_loop;
