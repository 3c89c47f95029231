//! Bounded audio channel abstraction (I2S peripheral behind a DMA FIFO)
//!
//! The real device double-buffers samples through DMA. A call hands bytes to
//! (or takes bytes from) that FIFO and returns how many actually moved; a
//! short count is always reported, never hidden, so callers loop until their
//! chunk is exhausted.
//!
//! Direction is part of the type: a transmit channel cannot be asked to
//! receive. Format and direction are fixed when the driver is constructed.

use embassy_time::{Duration, TimeoutError};
use thiserror_no_std::Error;

use crate::audio_types::{BitDepth, ChannelCount, SampleRateHz};

/// Fixed format of a hardware channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Frames per second
    pub sample_rate: SampleRateHz,
    /// Width of one sample
    pub bit_depth: BitDepth,
    /// Interleaved channels per frame
    pub channels: ChannelCount,
}

impl ChannelConfig {
    /// Bytes in one frame (one sample for every channel).
    #[must_use]
    pub fn bytes_per_frame(&self) -> u32 {
        u32::from(self.bit_depth.bytes()).saturating_mul(u32::from(self.channels.get()))
    }

    /// Bytes produced or consumed per second of audio.
    #[must_use]
    pub fn bytes_per_second(&self) -> u32 {
        self.sample_rate.get().saturating_mul(self.bytes_per_frame())
    }
}

/// Failures a channel driver reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    /// DMA or peripheral fault.
    #[error("audio peripheral fault")]
    Hardware,
    /// FIFO under/overrun the driver could not recover from.
    #[error("audio FIFO overrun")]
    Overrun,
}

/// Common surface of both channel directions.
pub trait HardwareChannel {
    /// Format fixed at construction.
    fn config(&self) -> ChannelConfig;
}

/// Storage → speaker direction.
pub trait TransmitChannel: HardwareChannel {
    /// Queue `buf` for output, returning the number of bytes consumed.
    ///
    /// Waits until the FIFO has room; may consume fewer bytes than offered.
    fn transmit(
        &mut self,
        buf: &[u8],
    ) -> impl core::future::Future<Output = Result<usize, ChannelError>>;
}

/// Microphone → storage direction.
pub trait ReceiveChannel: HardwareChannel {
    /// Take captured bytes into `buf`, returning how many were produced.
    ///
    /// Waits until samples are available; may produce fewer bytes than
    /// `buf.len()`.
    fn receive(
        &mut self,
        buf: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, ChannelError>>;
}

/// How long a pump may wait on a single channel call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelWait {
    /// Give up after the duration and report a timeout.
    Bounded(Duration),
    /// Wait forever. A stalled peripheral hangs the whole device.
    Unbounded,
}

impl ChannelWait {
    /// Drive `fut` under this wait policy.
    pub async fn apply<F>(self, fut: F) -> Result<F::Output, TimeoutError>
    where
        F: core::future::Future,
    {
        match self {
            Self::Bounded(limit) => embassy_time::with_timeout(limit, fut).await,
            Self::Unbounded => Ok(fut.await),
        }
    }
}

impl Default for ChannelWait {
    fn default() -> Self {
        Self::Bounded(Duration::from_millis(500))
    }
}
