//! Hardware Abstraction Layer for the media streaming firmware
//!
//! This crate provides trait-based abstractions for every collaborator the
//! streaming engine talks to, enabling development and testing without
//! physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate: scheduler, capture flow)
//!         ↓
//! Engine Layers (playback: pumps + WAV writer, ui: bitmap decoder + clock)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (SD card, I2S DMA, SPI display, Wi-Fi stack)
//! ```
//!
//! # Abstractions
//!
//! - [`Storage`] / [`File`] / [`BlockStream`] - named objects on block storage
//! - [`TransmitChannel`] / [`ReceiveChannel`] - bounded audio FIFOs (I2S + DMA)
//! - [`RenderSink`] - pixel and text output
//! - [`MomentaryInput`] - a single push button
//! - [`Uploader`] - one-shot HTTP upload of a finished file
//!
//! # Features
//!
//! - `std`: local-filesystem storage and host mocks
//! - `defmt`: defmt derives and log output (hardware)
//! - `tracing`: tracing log output (desktop emulator)
//!
//! # Example
//!
//! ```no_run
//! use platform::{BlockStream, OpenMode, Storage};
//!
//! async fn first_byte<S: Storage>(storage: &mut S) -> Option<u8> {
//!     let mut stream = BlockStream::open(storage, "/songs/song1.wav", OpenMode::Read)
//!         .await
//!         .ok()?;
//!     let mut byte = [0u8; 1];
//!     let n = stream.read(&mut byte).await.ok()?;
//!     stream.close().await.ok()?;
//!     (n == 1).then_some(byte[0])
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(async_fn_in_trait)] // single-threaded cooperative executor, Send bounds not needed

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod fmt;

pub mod audio;
pub mod audio_types;
pub mod block_stream;
pub mod config;
pub mod display;
pub mod input;
pub mod network;
pub mod storage;

#[cfg(feature = "std")]
pub mod storage_local;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

// Re-export main high-level traits
pub use audio::{ChannelConfig, ChannelError, ChannelWait, HardwareChannel, ReceiveChannel, TransmitChannel};
pub use audio_types::{BitDepth, ChannelCount, OutOfRangeError, SampleRateHz};
pub use block_stream::BlockStream;
pub use display::RenderSink;
pub use input::MomentaryInput;
pub use network::{UploadError, UploadRequest, UploadResponse, Uploader};
pub use storage::{File, OpenMode, Storage, StorageError};
