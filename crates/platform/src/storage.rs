//! Storage abstraction for block-storage volumes

use thiserror_no_std::Error;

/// Direction a file is opened in. Fixed for the lifetime of the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenMode {
    /// Read-only, starting at offset 0.
    Read,
    /// Write-only. Creates the file, truncating any previous content.
    Write,
}

/// Storage failures shared by every storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// No object with the requested name exists.
    #[error("file not found")]
    NotFound,
    /// The volume is not mounted (card missing or unreadable).
    #[error("storage volume not mounted")]
    NotMounted,
    /// The device failed to return data.
    #[error("storage read failed")]
    Read,
    /// The device refused data: storage full or unavailable.
    #[error("storage write failed")]
    Write,
    /// Seek target outside the range allowed for this stream.
    #[error("seek out of range")]
    Seek,
    /// Read on a write stream, or write on a read stream.
    #[error("operation not allowed in this open mode")]
    WrongMode,
    /// The stream has already been closed.
    #[error("stream closed")]
    Closed,
}

/// Storage trait for volume access
pub trait Storage {
    /// File type
    type File: File;

    /// Mount the volume. Must succeed before any file is opened.
    fn mount(&mut self) -> impl core::future::Future<Output = Result<(), StorageError>>;

    /// Open `path` in `mode`.
    ///
    /// [`OpenMode::Read`] fails with [`StorageError::NotFound`] when the
    /// object does not exist; [`OpenMode::Write`] creates it.
    fn open_file(
        &mut self,
        path: &str,
        mode: OpenMode,
    ) -> impl core::future::Future<Output = Result<Self::File, StorageError>>;

    /// Check if path exists
    fn exists(
        &mut self,
        path: &str,
    ) -> impl core::future::Future<Output = Result<bool, StorageError>>;
}

/// Raw file handle as exposed by a storage driver.
///
/// Application code goes through [`crate::BlockStream`], which adds mode
/// checks, position tracking and redundant-seek elimination on top.
pub trait File {
    /// Read from current position. `Ok(0)` means end of file.
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, StorageError>>;

    /// Write at current position, returning the number of bytes accepted.
    fn write(&mut self, buf: &[u8])
        -> impl core::future::Future<Output = Result<usize, StorageError>>;

    /// Seek to absolute position
    fn seek(&mut self, pos: u64) -> impl core::future::Future<Output = Result<u64, StorageError>>;

    /// Push buffered writes to the device.
    fn flush(&mut self) -> impl core::future::Future<Output = Result<(), StorageError>>;

    /// Get file size
    fn size(&self) -> u64;
}
