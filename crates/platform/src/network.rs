//! Upload collaborator: the one network call the device makes.
//!
//! After a capture is finalized the whole WAV file is posted as the request
//! body and the transcription service answers with a short text body. The
//! HTTP client itself (TLS, Wi-Fi association) is outside this crate.

use thiserror_no_std::Error;

use crate::block_stream::BlockStream;
use crate::storage::{File, StorageError};

/// Capacity of the response body kept from the server.
pub const RESPONSE_CAPACITY: usize = 256;

/// One POST request. The body is streamed from a [`BlockStream`].
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    /// Endpoint URL
    pub url: &'a str,
    /// Extra request headers as `(name, value)` pairs
    pub headers: &'a [(&'a str, &'a str)],
    /// Exact body length in bytes
    pub content_length: u64,
}

/// Server answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, truncated to [`RESPONSE_CAPACITY`] bytes
    pub body: heapless::String<RESPONSE_CAPACITY>,
}

impl UploadResponse {
    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Upload failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UploadError {
    /// Network unreachable or connection dropped.
    #[error("network unreachable")]
    Connectivity,
    /// The body could not be read from storage.
    #[error("upload body unreadable: {0}")]
    Body(StorageError),
}

impl From<StorageError> for UploadError {
    fn from(e: StorageError) -> Self {
        Self::Body(e)
    }
}

/// HTTP client used once per capture.
pub trait Uploader {
    /// POST `request` with `body` streamed from its current position to the end.
    fn post<F: File>(
        &mut self,
        request: &UploadRequest<'_>,
        body: &mut BlockStream<F>,
    ) -> impl core::future::Future<Output = Result<UploadResponse, UploadError>>;
}
