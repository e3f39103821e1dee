//! Interface of the admin file browser.
//!
//! The admin console only dispatches `list`, `read`, `create` and
//! `changedir` through this trait; the sandboxed implementation lives in
//! the infrastructure layer.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    /// Map a `/create` flag (`-f` or `-d`) to the kind it creates
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "-f" => Some(EntryKind::File),
            "-d" => Some(EntryKind::Directory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Contents of the working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Display path of the listed directory, e.g. `ROOT/docs`
    pub path: String,
    pub entries: Vec<DirEntry>,
    /// The root did not exist and was created by this listing
    pub created_root: bool,
}

#[derive(Debug, Error)]
pub enum BrowseError {
    #[error("'{0}' is outside the root directory")]
    OutsideRoot(String),

    #[error("'{0}' does not exist")]
    NotFound(String),

    #[error("'{0}' is not a directory")]
    NotADirectory(String),

    #[error("'{0}' is not a file")]
    NotAFile(String),

    #[error("'{0}' already exists")]
    AlreadyExists(String),

    #[error("filesystem error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Sandboxed file operations under a single root directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileBrowser: Send + Sync {
    /// List the working directory, creating the root if it is missing
    async fn list(&self) -> Result<Listing, BrowseError>;

    /// Read a file relative to the working directory
    async fn read(&self, name: &str) -> Result<String, BrowseError>;

    /// Create a file or directory relative to the working directory and
    /// return its display path
    async fn create(&self, kind: EntryKind, name: &str) -> Result<String, BrowseError>;

    /// Move the working directory and return its new display path
    async fn change_dir(&self, path: &str) -> Result<String, BrowseError>;
}
