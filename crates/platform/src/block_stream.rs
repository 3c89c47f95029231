//! `BlockStream`: the cursor every streaming component reads or writes through.
//!
//! A stream is opened in one [`OpenMode`] and keeps it for its whole life.
//! The wrapper tracks the byte position itself so that a seek to the
//! position the cursor already sits at never reaches the storage driver;
//! on SD cards a seek costs a FAT cluster-chain walk.
//!
//! Dropping a stream releases the handle without flushing. Every owner calls
//! [`BlockStream::close`] on both its success and its error path.

use crate::storage::{File, OpenMode, Storage, StorageError};

/// Sequential / random-access byte cursor over one stored object.
pub struct BlockStream<F: File> {
    file: Option<F>,
    mode: OpenMode,
    position: u64,
    len: u64,
}

impl<F: File> BlockStream<F> {
    /// Open `path` on `storage`.
    pub async fn open<S>(storage: &mut S, path: &str, mode: OpenMode) -> Result<Self, StorageError>
    where
        S: Storage<File = F>,
    {
        let file = storage.open_file(path, mode).await?;
        trace!("opened stream: {}", path);
        Ok(Self::from_file(file, mode))
    }

    /// Wrap an already-open driver handle positioned at offset 0.
    pub fn from_file(file: F, mode: OpenMode) -> Self {
        let len = file.size();
        Self {
            file: Some(file),
            mode,
            position: 0,
            len,
        }
    }

    /// Direction this stream was opened in.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Current byte offset.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Length of the object. Grows as a write stream is extended.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// `true` when the object holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `true` once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Read up to `buf.len()` bytes. `Ok(0)` means end of stream.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        if self.mode != OpenMode::Read {
            return Err(StorageError::WrongMode);
        }
        let file = self.file.as_mut().ok_or(StorageError::Closed)?;
        let n = file.read(buf).await?;
        self.position = self.position.saturating_add(n as u64);
        Ok(n)
    }

    /// Keep reading until `buf` is full or the stream ends.
    ///
    /// Returns the number of bytes placed in `buf`; less than `buf.len()`
    /// only at end of stream.
    pub async fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        let mut filled = 0usize;
        while let Some(rest) = buf.get_mut(filled..) {
            if rest.is_empty() {
                break;
            }
            let n = self.read(rest).await?;
            if n == 0 {
                break;
            }
            filled = filled.saturating_add(n);
        }
        Ok(filled)
    }

    /// Write `buf` at the current position, returning the count accepted.
    pub async fn write(&mut self, buf: &[u8]) -> Result<usize, StorageError> {
        if self.mode != OpenMode::Write {
            return Err(StorageError::WrongMode);
        }
        let file = self.file.as_mut().ok_or(StorageError::Closed)?;
        let n = file.write(buf).await?;
        self.position = self.position.saturating_add(n as u64);
        self.len = self.len.max(self.position);
        Ok(n)
    }

    /// Write every byte of `buf` or fail with [`StorageError::Write`].
    pub async fn write_all(&mut self, buf: &[u8]) -> Result<(), StorageError> {
        let mut written = 0usize;
        while let Some(rest) = buf.get(written..) {
            if rest.is_empty() {
                break;
            }
            let n = self.write(rest).await?;
            if n == 0 {
                // Device accepted nothing: the volume is full.
                return Err(StorageError::Write);
            }
            written = written.saturating_add(n);
        }
        Ok(())
    }

    /// Move the cursor to absolute offset `pos`.
    ///
    /// Write streams may only seek within `[0, len]`. A seek to the current
    /// position is a no-op and does not reach the driver.
    pub async fn seek(&mut self, pos: u64) -> Result<(), StorageError> {
        if self.mode == OpenMode::Write && pos > self.len {
            return Err(StorageError::Seek);
        }
        if pos == self.position {
            return Ok(());
        }
        let file = self.file.as_mut().ok_or(StorageError::Closed)?;
        let landed = file.seek(pos).await?;
        if landed != pos {
            return Err(StorageError::Seek);
        }
        self.position = pos;
        Ok(())
    }

    /// Flush (write streams) and release the handle. Idempotent.
    pub async fn close(&mut self) -> Result<(), StorageError> {
        match self.file.take() {
            Some(mut file) if self.mode == OpenMode::Write => file.flush().await,
            _ => Ok(()),
        }
    }
}
