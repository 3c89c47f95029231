//! Media Streamer Firmware
//!
//! Cooperative application layer of the streaming media device: a song
//! playlist streamed to the I2S speaker, a bitmap slideshow and a clock on
//! the TFT, one push button, and a one-shot microphone capture that is
//! uploaded for transcription.
//!
//! # Architecture
//!
//! This firmware follows a layered architecture:
//!
//! ```text
//! Application Layer (main.rs, scheduler, capture flow)
//!         ↓
//! Engines (playback pumps + WAV writer, ui bitmap decoder + overlays)
//!         ↓
//! Platform HAL (storage, channels, render sink, button, uploader)
//!         ↓
//! Hardware / desktop emulator
//! ```
//!
//! # Features
//!
//! - `emulator` - Build the desktop emulator (tokio, tracing, local files)
//! - `std` - Enable standard library (for emulator and testing)
//! - `defmt` / `tracing` - Log backend
//!
//! # Examples
//!
//! ## Emulator Target
//!
//! ```bash
//! MEDIA_ROOT=./media cargo run -p firmware --bin emulator --features emulator
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
// Logging discipline
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

#[macro_use]
mod fmt;

pub mod boot;
pub mod capture;
pub mod catalog;
pub mod config;
pub mod context;
pub mod scheduler;

#[cfg(feature = "emulator")]
pub mod emulator;

use platform::{StorageError, UploadError};
use playback::{PumpError, WavError};
use thiserror_no_std::Error;
use ui::BitmapError;

pub use capture::{capture_and_transcribe, Transcript};
pub use catalog::{MediaCatalog, MediaList, MediaPath};
pub use config::{AudioScheduling, ConfigError, DeviceConfig};
pub use context::DeviceContext;
pub use scheduler::{AudioStep, InputStep, Iteration, Scheduler};

/// Errors surfaced by the application layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FirmwareError {
    /// Invalid device configuration.
    #[error("config: {0}")]
    Config(ConfigError),
    /// Storage failure outside a pump.
    #[error("storage: {0}")]
    Storage(StorageError),
    /// Playback or capture pump failure.
    #[error("pump: {0}")]
    Pump(PumpError),
    /// WAV container failure.
    #[error("wav: {0}")]
    Wav(WavError),
    /// Bitmap decode failure.
    #[error("bitmap: {0}")]
    Bitmap(BitmapError),
    /// Upload failure.
    #[error("upload: {0}")]
    Upload(UploadError),
    /// The render sink rejected a draw call.
    #[error("display write failed")]
    Display,
}

impl From<ConfigError> for FirmwareError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StorageError> for FirmwareError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<PumpError> for FirmwareError {
    fn from(e: PumpError) -> Self {
        Self::Pump(e)
    }
}

impl From<WavError> for FirmwareError {
    fn from(e: WavError) -> Self {
        match e {
            WavError::Storage(inner) => Self::Storage(inner),
            other => Self::Wav(other),
        }
    }
}

impl From<BitmapError> for FirmwareError {
    fn from(e: BitmapError) -> Self {
        Self::Bitmap(e)
    }
}

impl From<UploadError> for FirmwareError {
    fn from(e: UploadError) -> Self {
        Self::Upload(e)
    }
}
