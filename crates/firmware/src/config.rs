//! Device configuration
//!
//! Every tunable the scheduler and the capture flow read lives in
//! [`DeviceConfig`]. `Default` reproduces the stock device: 4 KiB playback
//! chunks, 1 KiB capture chunks, a 1 s clock, a 5 s slideshow and three
//! songs and three images on the card.

use embassy_time::Duration;
use embedded_graphics::prelude::Point;
use platform::config::USER_AGENT;
use platform::{BitDepth, ChannelConfig, ChannelCount, ChannelWait, SampleRateHz};
use thiserror_no_std::Error;
use ui::WallClock;

use crate::catalog::{MediaCatalog, MediaList};

/// How the audio gate shares the loop with the other gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioScheduling {
    /// Stream the whole current song each iteration. Clock and slideshow
    /// stall for the song's duration.
    FullFile,
    /// Stream one chunk per iteration.
    Chunked,
}

/// Rejected configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A chunk size is zero or above the pump maximum.
    #[error("chunk size {0} out of range")]
    ChunkSize(usize),
    /// Playback chunks must hold whole 16-bit samples.
    #[error("playback chunk {0} is odd")]
    OddPlaybackChunk(usize),
    /// Capture chunks must hold whole frames.
    #[error("capture chunk {0} is not a multiple of the frame size")]
    CaptureChunkMisaligned(usize),
    /// A media list has no entries.
    #[error("empty media list")]
    EmptyCatalog,
    /// A generated media path does not fit the path buffer.
    #[error("media path too long")]
    PathTooLong,
    /// A gate period is zero.
    #[error("zero gate period")]
    ZeroPeriod,
    /// The wall clock ticks in whole seconds.
    #[error("clock period is not a whole number of seconds")]
    FractionalClockPeriod,
    /// The microphone does not run at `capture_format`.
    #[error("microphone format differs from the capture format")]
    CaptureFormatMismatch,
    /// Capture duration is zero.
    #[error("zero capture duration")]
    ZeroCapture,
}

/// Tunables for one device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Bytes moved per playback tick (even)
    pub playback_chunk: usize,
    /// Bytes requested per microphone read (whole frames)
    pub capture_chunk: usize,
    /// Format of the speaker channel
    pub playback_format: ChannelConfig,
    /// Format of the microphone channel
    pub capture_format: ChannelConfig,
    /// Length of one recording
    pub capture_seconds: u32,
    /// Bound on every channel call
    pub channel_wait: ChannelWait,
    /// Audio gate policy
    pub audio_scheduling: AudioScheduling,
    /// Bitmap rows drawn per iteration; `0` draws a whole image per slide
    pub bitmap_rows_per_tick: u32,
    /// Clock gate period, whole seconds
    pub clock_period: Duration,
    /// Slideshow gate period
    pub slideshow_period: Duration,
    /// Minimum spacing between accepted button presses
    pub debounce: Duration,
    /// Playlist: `{prefix}{n}{suffix}` for `n` in `1..=count`
    pub songs: MediaList,
    /// Slideshow images, same naming scheme
    pub images: MediaList,
    /// Where the capture flow writes its recording
    pub recording_path: &'static str,
    /// Transcription endpoint
    pub upload_url: &'static str,
    /// Extra upload headers
    pub upload_headers: &'static [(&'static str, &'static str)],
    /// Time shown at boot
    pub initial_time: WallClock,
    /// Top-left corner of slideshow images
    pub image_origin: Point,
    /// Top-left corner of the clock overlay
    pub clock_origin: Point,
    /// Where the transcription text is printed
    pub transcript_origin: Point,
    /// Record and upload once before entering the loop
    pub capture_on_boot: bool,
}

const UPLOAD_HEADERS: &[(&str, &str)] = &[("Content-Type", "audio/wav"), ("User-Agent", USER_AGENT)];

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            playback_chunk: 4096,
            capture_chunk: 1024,
            playback_format: ChannelConfig {
                sample_rate: SampleRateHz::HZ_44100,
                bit_depth: BitDepth::Sixteen,
                channels: ChannelCount::STEREO,
            },
            capture_format: ChannelConfig {
                sample_rate: SampleRateHz::HZ_16000,
                bit_depth: BitDepth::Sixteen,
                channels: ChannelCount::MONO,
            },
            capture_seconds: 5,
            channel_wait: ChannelWait::default(),
            audio_scheduling: AudioScheduling::Chunked,
            bitmap_rows_per_tick: 8,
            clock_period: Duration::from_secs(1),
            slideshow_period: Duration::from_secs(5),
            debounce: Duration::from_millis(200),
            songs: MediaList::unchecked("/songs/song", ".wav", 3),
            images: MediaList::unchecked("/images/image", ".bmp", 3),
            recording_path: "/recording.wav",
            upload_url: "http://192.168.4.1:8080/transcribe",
            upload_headers: UPLOAD_HEADERS,
            initial_time: WallClock::midnight(),
            image_origin: Point::new(0, 0),
            clock_origin: Point::new(8, 8),
            transcript_origin: Point::new(8, 220),
            capture_on_boot: true,
        }
    }
}

impl DeviceConfig {
    /// Check every value and build the media catalog.
    pub fn validate(&self) -> Result<MediaCatalog, ConfigError> {
        use playback::pump::MAX_CHUNK;

        if self.playback_chunk < 2 || self.playback_chunk > MAX_CHUNK {
            return Err(ConfigError::ChunkSize(self.playback_chunk));
        }
        if self.playback_chunk & 1 != 0 {
            return Err(ConfigError::OddPlaybackChunk(self.playback_chunk));
        }
        if self.capture_chunk == 0 || self.capture_chunk > playback::capture::MAX_CHUNK {
            return Err(ConfigError::ChunkSize(self.capture_chunk));
        }
        let frame = self.capture_format.bytes_per_frame() as usize;
        if self.capture_chunk.checked_rem(frame) != Some(0) {
            return Err(ConfigError::CaptureChunkMisaligned(self.capture_chunk));
        }
        if self.clock_period.as_ticks() == 0 || self.slideshow_period.as_ticks() == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if Duration::from_secs(self.clock_period.as_secs()) != self.clock_period {
            return Err(ConfigError::FractionalClockPeriod);
        }
        if self.capture_seconds == 0 {
            return Err(ConfigError::ZeroCapture);
        }
        MediaCatalog::new(self.songs, self.images)
    }
}
