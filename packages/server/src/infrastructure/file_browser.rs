//! File browser confined to a root directory on the local filesystem.
//!
//! The working directory is kept as a path relative to the root and every
//! argument is resolved lexically against it: `.` is dropped, `..` pops one
//! component and popping past the root is refused. Absolute arguments are
//! refused as well. Symlinks inside the root are not resolved.

use std::{
    io,
    path::{Component, Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use tokio::fs;

use crate::domain::{BrowseError, DirEntry, EntryKind, FileBrowser, Listing};

pub struct LocalFileBrowser {
    root: PathBuf,
    cwd: Mutex<PathBuf>,
}

impl LocalFileBrowser {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cwd: Mutex::new(PathBuf::new()),
        }
    }

    fn cwd(&self) -> PathBuf {
        self.cwd.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_cwd(&self, relative: PathBuf) {
        *self.cwd.lock().unwrap_or_else(PoisonError::into_inner) = relative;
    }

    /// Resolve `input` against the working directory, staying under the root
    fn resolve(&self, input: &str) -> Result<PathBuf, BrowseError> {
        let mut resolved = self.cwd();
        for component in Path::new(input).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !resolved.pop() {
                        return Err(BrowseError::OutsideRoot(input.to_string()));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(BrowseError::OutsideRoot(input.to_string()));
                }
            }
        }
        Ok(resolved)
    }

    /// Display form of a root-relative path, e.g. `ROOT/docs/notes.txt`
    fn display(&self, relative: &Path) -> String {
        let mut shown = self.root.display().to_string();
        for part in relative.components() {
            shown.push('/');
            shown.push_str(&part.as_os_str().to_string_lossy());
        }
        shown
    }

    fn map_io(&self, relative: &Path, source: io::Error) -> BrowseError {
        let path = self.display(relative);
        match source.kind() {
            io::ErrorKind::NotFound => BrowseError::NotFound(path),
            io::ErrorKind::AlreadyExists => BrowseError::AlreadyExists(path),
            _ => BrowseError::Io { path, source },
        }
    }

    /// Create the root when missing; returns whether it was created
    async fn ensure_root(&self) -> Result<bool, BrowseError> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(false),
            Ok(_) => Err(BrowseError::NotADirectory(self.display(Path::new("")))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&self.root)
                    .await
                    .map_err(|e| self.map_io(Path::new(""), e))?;
                tracing::info!("Created root directory {}", self.root.display());
                Ok(true)
            }
            Err(e) => Err(self.map_io(Path::new(""), e)),
        }
    }
}

#[async_trait]
impl FileBrowser for LocalFileBrowser {
    async fn list(&self) -> Result<Listing, BrowseError> {
        let created_root = self.ensure_root().await?;
        let relative = self.cwd();

        let mut read_dir = fs::read_dir(self.root.join(&relative))
            .await
            .map_err(|e| self.map_io(&relative, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| self.map_io(&relative, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| self.map_io(&relative, e))?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind: if file_type.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Listing {
            path: self.display(&relative),
            entries,
            created_root,
        })
    }

    async fn read(&self, name: &str) -> Result<String, BrowseError> {
        let relative = self.resolve(name)?;
        let full = self.root.join(&relative);

        let meta = fs::metadata(&full)
            .await
            .map_err(|e| self.map_io(&relative, e))?;
        if meta.is_dir() {
            return Err(BrowseError::NotAFile(self.display(&relative)));
        }

        let content = fs::read(&full)
            .await
            .map_err(|e| self.map_io(&relative, e))?;
        Ok(String::from_utf8_lossy(&content).into_owned())
    }

    async fn create(&self, kind: EntryKind, name: &str) -> Result<String, BrowseError> {
        let relative = self.resolve(name)?;
        let full = self.root.join(&relative);

        let result = match kind {
            EntryKind::File => fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&full)
                .await
                .map(|_| ()),
            EntryKind::Directory => fs::create_dir(&full).await,
        };
        result.map_err(|e| self.map_io(&relative, e))?;

        let shown = self.display(&relative);
        tracing::info!("Created {:?} {}", kind, shown);
        Ok(shown)
    }

    async fn change_dir(&self, path: &str) -> Result<String, BrowseError> {
        let relative = self.resolve(path)?;
        let meta = fs::metadata(self.root.join(&relative))
            .await
            .map_err(|e| self.map_io(&relative, e))?;
        if !meta.is_dir() {
            return Err(BrowseError::NotADirectory(self.display(&relative)));
        }

        let shown = self.display(&relative);
        self.set_cwd(relative);
        Ok(shown)
    }
}
