//! Canonical 44-byte PCM WAV container, written in two phases.
//!
//! ```text
//! offset  field            value
//! 0       "RIFF"
//! 4       RIFF size        file length - 8   (0 until finalize)
//! 8       "WAVE"
//! 12      "fmt "
//! 16      fmt size         16
//! 20      format tag       1 (PCM)
//! 22      channels
//! 24      sample rate
//! 28      byte rate
//! 32      block align
//! 34      bits per sample
//! 36      "data"
//! 40      data size        file length - 44  (0 until finalize)
//! 44      samples...
//! ```
//!
//! [`WavWriter::create`] writes the header with both size fields zeroed,
//! [`WavWriter::append`] streams samples, and [`WavWriter::finalize`]
//! patches the two fields and closes the stream. `finalize` consumes the
//! writer, so it runs at most once.

use platform::{BitDepth, BlockStream, ChannelConfig, ChannelCount, File, OpenMode, SampleRateHz, StorageError};
use thiserror_no_std::Error;

/// Length of the canonical PCM header.
pub const HEADER_LEN: usize = 44;

const RIFF_SIZE_OFFSET: u64 = 4;
const DATA_SIZE_OFFSET: u64 = 40;
const FMT_CHUNK_LEN: u32 = 16;
const FORMAT_PCM: u16 = 1;

/// Largest payload whose sizes still fit the 32-bit header fields
/// (`u32::MAX - 44`).
const MAX_DATA_LEN: u64 = 0xFFFF_FFD3;

/// WAV container errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WavError {
    /// The underlying stream failed.
    #[error("storage: {0}")]
    Storage(StorageError),
    /// The payload no longer fits 32-bit size fields.
    #[error("WAV payload exceeds 4 GiB")]
    TooLarge,
    /// Bytes are not a canonical PCM WAV header.
    #[error("not a canonical PCM WAV header")]
    Format,
}

impl From<StorageError> for WavError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

/// Decoded view of the 44-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// Sample format
    pub config: ChannelConfig,
    /// RIFF chunk size (file length - 8)
    pub riff_size: u32,
    /// Data chunk size (file length - 44)
    pub data_size: u32,
}

impl WavHeader {
    /// Header with both size fields set to the zero placeholder.
    pub fn provisional(config: ChannelConfig) -> Self {
        Self {
            config,
            riff_size: 0,
            data_size: 0,
        }
    }

    /// Serialize to the on-disk little-endian layout.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let channels = u16::from(self.config.channels.get());
        let bits = self.config.bit_depth.bits();
        let block_align = channels.saturating_mul(self.config.bit_depth.bytes());
        let riff = self.riff_size.to_le_bytes();
        let fmt_len = FMT_CHUNK_LEN.to_le_bytes();
        let tag = FORMAT_PCM.to_le_bytes();
        let chans = channels.to_le_bytes();
        let rate = self.config.sample_rate.get().to_le_bytes();
        let byte_rate = self.config.bytes_per_second().to_le_bytes();
        let align = block_align.to_le_bytes();
        let bits = bits.to_le_bytes();
        let data = self.data_size.to_le_bytes();
        let fields: [&[u8]; 13] = [
            b"RIFF", &riff, b"WAVE", b"fmt ", &fmt_len, &tag, &chans, &rate, &byte_rate, &align,
            &bits, b"data", &data,
        ];

        let mut out = [0u8; HEADER_LEN];
        for (dst, src) in out.iter_mut().zip(fields.into_iter().flatten()) {
            *dst = *src;
        }
        out
    }

    /// Parse a canonical PCM header.
    pub fn decode(bytes: &[u8]) -> Result<Self, WavError> {
        let tag = |at: usize| bytes.get(at..).and_then(|b| b.get(..4));
        let tags_ok = tag(0) == Some(b"RIFF".as_slice())
            && tag(8) == Some(b"WAVE".as_slice())
            && tag(12) == Some(b"fmt ".as_slice())
            && tag(36) == Some(b"data".as_slice());
        if !tags_ok {
            return Err(WavError::Format);
        }
        if le_u32(bytes, 16) != Some(FMT_CHUNK_LEN) || le_u16(bytes, 20) != Some(FORMAT_PCM) {
            return Err(WavError::Format);
        }
        let channels = le_u16(bytes, 22)
            .and_then(|c| u8::try_from(c).ok())
            .and_then(|c| ChannelCount::new(c).ok())
            .ok_or(WavError::Format)?;
        let sample_rate = le_u32(bytes, 24)
            .and_then(|r| SampleRateHz::new(r).ok())
            .ok_or(WavError::Format)?;
        let bit_depth = le_u16(bytes, 34)
            .and_then(|b| BitDepth::from_bits(b).ok())
            .ok_or(WavError::Format)?;
        Ok(Self {
            config: ChannelConfig {
                sample_rate,
                bit_depth,
                channels,
            },
            riff_size: le_u32(bytes, 4).ok_or(WavError::Format)?,
            data_size: le_u32(bytes, 40).ok_or(WavError::Format)?,
        })
    }
}

fn le_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let raw = bytes.get(at..)?.get(..2)?;
    Some(u16::from_le_bytes(raw.try_into().ok()?))
}

fn le_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..)?.get(..4)?;
    Some(u32::from_le_bytes(raw.try_into().ok()?))
}

/// Lifecycle of a writer that has not been finalized yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WavState {
    /// Header written, no samples yet.
    HeaderWritten,
    /// At least one append has happened.
    Streaming,
}

/// Sizes recorded by [`WavWriter::finalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WavSummary {
    /// Total file length
    pub total_len: u64,
    /// Value written to the RIFF size field
    pub riff_size: u32,
    /// Value written to the data size field
    pub data_size: u32,
}

/// Two-phase WAV writer over a write stream.
///
/// Dropping a writer without calling [`finalize`](Self::finalize) leaves a
/// header with zero sizes on storage; a warning is logged when that happens.
pub struct WavWriter<F: File> {
    stream: BlockStream<F>,
    config: ChannelConfig,
    data_len: u64,
    state: WavState,
    finalized: bool,
}

impl<F: File> WavWriter<F> {
    /// Write the provisional header at the start of `stream`.
    ///
    /// The stream is closed before an error is returned.
    pub async fn create(mut stream: BlockStream<F>, config: ChannelConfig) -> Result<Self, WavError> {
        let written = if stream.mode() == OpenMode::Write {
            stream.write_all(&WavHeader::provisional(config).encode()).await
        } else {
            Err(StorageError::WrongMode)
        };
        if let Err(e) = written {
            if let Err(close) = stream.close().await {
                warn!("wav close failed: {}", close);
            }
            return Err(e.into());
        }
        Ok(Self {
            stream,
            config,
            data_len: 0,
            state: WavState::HeaderWritten,
            finalized: false,
        })
    }

    /// Append raw PCM bytes after everything written so far.
    pub async fn append(&mut self, pcm: &[u8]) -> Result<(), WavError> {
        let data_len = self.data_len.saturating_add(pcm.len() as u64);
        if data_len > MAX_DATA_LEN {
            return Err(WavError::TooLarge);
        }
        self.stream.write_all(pcm).await?;
        self.data_len = data_len;
        self.state = WavState::Streaming;
        Ok(())
    }

    /// Patch both size fields from the final length and close the stream.
    ///
    /// The stream is closed on the error path too; the file is then left
    /// with whatever the failed patch produced.
    pub async fn finalize(mut self) -> Result<WavSummary, WavError> {
        self.finalized = true;
        let result = self.patch_sizes().await;
        let closed = self.stream.close().await;
        let summary = result?;
        closed?;
        info!(
            "wav finalized: {} bytes, data {}",
            summary.total_len, summary.data_size
        );
        Ok(summary)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WavState {
        self.state
    }

    /// PCM bytes appended so far.
    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    /// Format written into the header.
    pub fn config(&self) -> ChannelConfig {
        self.config
    }

    async fn patch_sizes(&mut self) -> Result<WavSummary, WavError> {
        let total_len = self.stream.len();
        let riff_size = u32::try_from(total_len.saturating_sub(8)).map_err(|_| WavError::TooLarge)?;
        let data_size =
            u32::try_from(total_len.saturating_sub(HEADER_LEN as u64)).map_err(|_| WavError::TooLarge)?;
        self.stream.seek(RIFF_SIZE_OFFSET).await?;
        self.stream.write_all(&riff_size.to_le_bytes()).await?;
        self.stream.seek(DATA_SIZE_OFFSET).await?;
        self.stream.write_all(&data_size.to_le_bytes()).await?;
        Ok(WavSummary {
            total_len,
            riff_size,
            data_size,
        })
    }
}

impl<F: File> Drop for WavWriter<F> {
    fn drop(&mut self) {
        if !self.finalized {
            warn!("wav writer dropped before finalize, {} data bytes", self.data_len);
        }
    }
}
