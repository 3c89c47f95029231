//! Audio domain newtypes for compile-time safety.
//!
//! These zero-cost abstractions prevent common errors:
//! - `SampleRateHz`: validates 8000–192000 Hz (what an I2S peripheral clocks)
//! - `BitDepth`: only whole-byte PCM widths the channel can carry
//! - `ChannelCount`: mono or stereo, nothing else

use thiserror_no_std::Error;

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("value {value} outside {min}..={max}")]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

// ── SampleRateHz ─────────────────────────────────────────────────────────────

/// Sample rate in Hz, validated to the range the I2S peripheral supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct SampleRateHz(u32);

impl SampleRateHz {
    /// Minimum supported sample rate: 8000 Hz (telephony).
    pub const MIN_HZ: u32 = 8_000;

    /// Maximum supported sample rate: 192000 Hz.
    pub const MAX_HZ: u32 = 192_000;

    /// 16 kHz, the microphone capture rate.
    pub const HZ_16000: Self = Self(16_000);

    /// 44.1 kHz, CD audio.
    pub const HZ_44100: Self = Self(44_100);

    /// Create a `SampleRateHz`, returning an error if out of range.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `hz < 8000` or `hz > 192000`.
    pub fn new(hz: u32) -> Result<Self, OutOfRangeError> {
        if (Self::MIN_HZ..=Self::MAX_HZ).contains(&hz) {
            Ok(Self(hz))
        } else {
            Err(OutOfRangeError {
                value: hz,
                min: Self::MIN_HZ,
                max: Self::MAX_HZ,
            })
        }
    }

    /// Return the sample rate in Hz.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

// ── BitDepth ─────────────────────────────────────────────────────────────────

/// PCM sample width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitDepth {
    /// 8-bit unsigned PCM
    Eight,
    /// 16-bit signed PCM (the only width the capture microphone produces)
    Sixteen,
    /// 24-bit signed PCM, packed in 3 bytes
    TwentyFour,
    /// 32-bit signed PCM
    ThirtyTwo,
}

impl BitDepth {
    /// Parse a raw bits-per-sample value.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] for anything but 8, 16, 24 or 32.
    pub fn from_bits(bits: u16) -> Result<Self, OutOfRangeError> {
        match bits {
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            24 => Ok(Self::TwentyFour),
            32 => Ok(Self::ThirtyTwo),
            other => Err(OutOfRangeError {
                value: u32::from(other),
                min: 8,
                max: 32,
            }),
        }
    }

    /// Bits per sample.
    #[must_use]
    pub fn bits(self) -> u16 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
            Self::TwentyFour => 24,
            Self::ThirtyTwo => 32,
        }
    }

    /// Bytes per sample.
    #[must_use]
    pub fn bytes(self) -> u16 {
        self.bits() / 8
    }
}

// ── ChannelCount ─────────────────────────────────────────────────────────────

/// Interleaved channel count: 1 (mono) or 2 (stereo).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct ChannelCount(u8);

impl ChannelCount {
    /// Single channel.
    pub const MONO: Self = Self(1);
    /// Two interleaved channels.
    pub const STEREO: Self = Self(2);

    /// Create a `ChannelCount`, rejecting anything but 1 or 2.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `count` is 0 or above 2.
    pub fn new(count: u8) -> Result<Self, OutOfRangeError> {
        if (1..=2).contains(&count) {
            Ok(Self(count))
        } else {
            Err(OutOfRangeError {
                value: u32::from(count),
                min: 1,
                max: 2,
            })
        }
    }

    /// Return the channel count.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}
