//! Local filesystem Storage implementation for the desktop emulator.
//!
//! `LocalFileStorage` implements `platform::Storage` using `std::fs`.
//! Used when the `std` feature is enabled (emulator builds only).
//! Device paths (`/songs/song1.wav`) are resolved relative to the media root
//! provided at construction.

use std::fs;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::string::String;

use crate::storage::{File, OpenMode, Storage, StorageError};

/// An open file on the local filesystem.
pub struct LocalFile {
    inner: fs::File,
    size: u64,
}

impl File for LocalFile {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        Read::read(&mut self.inner, buf).map_err(|_| StorageError::Read)
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, StorageError> {
        let n = Write::write(&mut self.inner, buf).map_err(|_| StorageError::Write)?;
        let end = self
            .inner
            .stream_position()
            .map_err(|_| StorageError::Write)?;
        self.size = self.size.max(end);
        Ok(n)
    }

    async fn seek(&mut self, pos: u64) -> Result<u64, StorageError> {
        Seek::seek(&mut self.inner, SeekFrom::Start(pos)).map_err(|_| StorageError::Seek)
    }

    async fn flush(&mut self) -> Result<(), StorageError> {
        self.inner.sync_data().map_err(|_| StorageError::Write)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// A `platform::Storage` implementation backed by `std::fs`.
///
/// # Example
/// ```no_run
/// # async fn example() {
/// use platform::storage_local::LocalFileStorage;
/// use platform::{OpenMode, Storage};
/// let mut storage = LocalFileStorage::new("/home/user/media");
/// storage.mount().await.unwrap();
/// let file = storage.open_file("/songs/song1.wav", OpenMode::Read).await.unwrap();
/// # }
/// ```
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Create a new storage rooted at `media_root`.
    #[must_use]
    pub fn new(media_root: &str) -> Self {
        Self {
            root: PathBuf::from(media_root),
        }
    }

    /// Create from the `MEDIA_ROOT` environment variable.
    ///
    /// Returns `None` if `MEDIA_ROOT` is not set or is not valid UTF-8.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("MEDIA_ROOT").ok().map(|p| Self::new(&p))
    }

    /// Media root as a lossy UTF-8 string, for the boot log.
    pub fn root_display(&self) -> String {
        self.root.to_string_lossy().into_owned()
    }

    fn resolve(&self, path: &str) -> PathBuf {
        // Device paths are absolute; joining one would discard the root.
        self.root.join(path.trim_start_matches('/'))
    }
}

fn open_error(kind: ErrorKind) -> StorageError {
    match kind {
        ErrorKind::NotFound => StorageError::NotFound,
        _ => StorageError::Read,
    }
}

impl Storage for LocalFileStorage {
    type File = LocalFile;

    async fn mount(&mut self) -> Result<(), StorageError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(StorageError::NotMounted)
        }
    }

    async fn open_file(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, StorageError> {
        let full = self.resolve(path);
        match mode {
            OpenMode::Read => {
                let file = fs::File::open(&full).map_err(|e| open_error(e.kind()))?;
                let meta = file.metadata().map_err(|_| StorageError::Read)?;
                Ok(LocalFile {
                    inner: file,
                    size: meta.len(),
                })
            }
            OpenMode::Write => {
                if let Some(parent) = full.parent() {
                    fs::create_dir_all(parent).map_err(|_| StorageError::Write)?;
                }
                let file = fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&full)
                    .map_err(|_| StorageError::Write)?;
                Ok(LocalFile {
                    inner: file,
                    size: 0,
                })
            }
        }
    }

    async fn exists(&mut self, path: &str) -> Result<bool, StorageError> {
        Ok(self.resolve(path).exists())
    }
}
