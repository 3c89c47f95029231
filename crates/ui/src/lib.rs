//! Display layer: streamed bitmap decoding, clock and text overlays, list cursors.
//!
//! This crate is `no_std` by default; it only uses `core`, `heapless` and
//! `embedded-graphics` primitives. Everything reaches the panel through
//! [`platform::RenderSink`].

#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]
#![allow(async_fn_in_trait)]

#[macro_use]
mod fmt;

pub mod bitmap;
pub mod clock;
pub mod color;
pub mod cursor;
pub mod text;

pub use bitmap::{draw_bitmap, row_stride, BitmapError, BitmapHeader, BitmapRowDecoder, BitmapSummary};
pub use clock::{ClockOverlay, WallClock};
pub use color::bgr_to_rgb565;
pub use cursor::ListCursor;
pub use text::{draw_text, TextStyle};
