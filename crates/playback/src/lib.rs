//! Audio streaming engine: storage ⇄ I2S pumps and the WAV container writer
//!
//! - [`PlaybackPump`] moves a stored file into a [`platform::TransmitChannel`]
//!   one fixed-size chunk per tick.
//! - [`CapturePump`] moves an exact number of frames from a
//!   [`platform::ReceiveChannel`] into a [`PcmSink`].
//! - [`WavWriter`] wraps a write stream with the header-then-patch protocol.
#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![allow(async_fn_in_trait)]

#[macro_use]
mod fmt;

pub mod capture;
pub mod engine;
pub mod pump;
pub mod wav;

use platform::{ChannelError, StorageError};
use thiserror_no_std::Error;

pub use capture::{CapturePump, CaptureStats, PcmSink};
pub use engine::{StreamState, StreamTask};
pub use pump::{PlaybackPump, PumpStats, Tick};
pub use wav::{WavError, WavHeader, WavState, WavSummary, WavWriter};

/// Consecutive zero-byte channel calls tolerated before a pump gives up.
pub const MAX_IDLE_TRANSFERS: u32 = 8;

/// Errors returned by the pumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PumpError {
    /// The backing stream failed.
    #[error("storage: {0}")]
    Storage(StorageError),
    /// The channel driver reported a fault.
    #[error("audio channel: {0}")]
    Channel(ChannelError),
    /// The channel made no progress within its bounded wait.
    #[error("audio channel timed out")]
    ChannelTimeout,
    /// A tick was requested with no file in progress.
    #[error("no stream in progress")]
    NotStreaming,
    /// The WAV container rejected the samples.
    #[error("container: {0}")]
    Container(WavError),
}

impl From<StorageError> for PumpError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ChannelError> for PumpError {
    fn from(e: ChannelError) -> Self {
        Self::Channel(e)
    }
}

impl From<WavError> for PumpError {
    fn from(e: WavError) -> Self {
        match e {
            WavError::Storage(inner) => Self::Storage(inner),
            other => Self::Container(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    /// Stream task state machine tests
    mod engine_tests {
        use crate::engine::{StreamState, StreamTask};
        use crate::PumpError;

        #[test]
        fn test_task_starts_idle() {
            let task = StreamTask::new();
            assert_eq!(task.state(), StreamState::Idle);
            assert_eq!(task.position(), None);
        }

        #[test]
        fn test_begin_streams_from_zero() {
            let mut task = StreamTask::new();
            task.begin();
            assert_eq!(task.state(), StreamState::Streaming { position: 0 });
        }

        #[test]
        fn test_advance_accumulates_position() {
            let mut task = StreamTask::new();
            task.begin();
            task.advance(4096).expect("advance while streaming");
            assert_eq!(task.advance(100).unwrap(), 4196);
            assert_eq!(task.position(), Some(4196));
        }

        #[test]
        fn test_finish_reports_final_position() {
            let mut task = StreamTask::new();
            task.begin();
            task.advance(10).unwrap();
            assert_eq!(task.finish(), Ok(10));
            assert_eq!(task.state(), StreamState::Done);
        }

        #[test]
        fn test_cannot_advance_when_idle_or_done() {
            let mut task = StreamTask::new();
            assert_eq!(task.advance(1), Err(PumpError::NotStreaming));
            task.begin();
            task.finish().unwrap();
            assert_eq!(task.advance(1), Err(PumpError::NotStreaming));
            assert_eq!(task.finish(), Err(PumpError::NotStreaming));
        }

        #[test]
        fn test_begin_after_done_restarts() {
            let mut task = StreamTask::new();
            task.begin();
            task.advance(50).unwrap();
            task.finish().unwrap();
            task.begin();
            assert_eq!(task.position(), Some(0));
        }

        #[test]
        fn test_reset_returns_to_idle() {
            let mut task = StreamTask::new();
            task.begin();
            task.reset();
            assert!(!task.is_streaming());
            assert_eq!(task.state(), StreamState::Idle);
        }
    }

    /// Error conversion tests
    mod error_tests {
        use crate::{PumpError, WavError};
        use platform::StorageError;

        #[test]
        fn test_wav_storage_error_flattens() {
            let e: PumpError = WavError::Storage(StorageError::Write).into();
            assert_eq!(e, PumpError::Storage(StorageError::Write));
        }

        #[test]
        fn test_wav_size_error_is_container() {
            let e: PumpError = WavError::TooLarge.into();
            assert_eq!(e, PumpError::Container(WavError::TooLarge));
        }

        #[test]
        fn test_errors_display() {
            let s = format!("{}", PumpError::Storage(StorageError::NotFound));
            assert_eq!(s, "storage: file not found");
        }
    }
}
