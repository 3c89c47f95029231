//! Capture → WAV → upload → on-screen transcription.
//!
//! The flow is one-shot and linear:
//!
//! 1. open the recording path for writing and lay down a provisional header
//! 2. pump `capture_seconds` of microphone audio into it
//! 3. finalize (patch both size fields, close)
//! 4. reopen the file for reading and post it as the request body
//! 5. print the response text on the panel
//!
//! The recording format is `config.capture_format`; a microphone running at
//! any other format is refused before the file is touched.
//!
//! A microphone that stalls mid-capture still yields a finalized, shorter
//! recording. Network failures are logged and returned; there is no retry.

use embedded_graphics::pixelcolor::Rgb565;
use platform::{BlockStream, OpenMode, ReceiveChannel, RenderSink, Storage, UploadRequest, Uploader};
use platform::network::RESPONSE_CAPACITY;
use playback::{CapturePump, PumpError, WavSummary, WavWriter};
use ui::{draw_text, TextStyle};

use crate::config::{ConfigError, DeviceConfig};
use crate::FirmwareError;

/// Outcome of a capture that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    /// HTTP status
    pub status: u16,
    /// Response body as printed
    pub text: heapless::String<RESPONSE_CAPACITY>,
    /// Sizes of the uploaded recording
    pub recording: WavSummary,
    /// Whole frames captured
    pub frames: u64,
}

/// Style of the printed transcription.
pub const TRANSCRIPT_STYLE: TextStyle = TextStyle::new(Rgb565::new(31, 63, 31), 1);

/// Record, finalize, upload and print.
///
/// Nothing else may hold a stream open on `storage` while this runs.
pub async fn capture_and_transcribe<S, R, U, D>(
    storage: &mut S,
    microphone: &mut R,
    uploader: &mut U,
    display: &mut D,
    config: &DeviceConfig,
) -> Result<Transcript, FirmwareError>
where
    S: Storage,
    R: ReceiveChannel,
    U: Uploader,
    D: RenderSink,
{
    let format = config.capture_format;
    if microphone.config() != format {
        error!("microphone format differs from the capture format");
        return Err(ConfigError::CaptureFormatMismatch.into());
    }
    let frames = u64::from(format.sample_rate.get()).saturating_mul(u64::from(config.capture_seconds));

    let stream = BlockStream::open(storage, config.recording_path, OpenMode::Write).await?;
    let mut wav = WavWriter::create(stream, format).await?;

    let mut pump = CapturePump::new(config.capture_chunk, config.channel_wait);
    let captured = pump.record_frames(microphone, &mut wav, frames).await;
    // Finalized whatever the capture outcome.
    let finalized = wav.finalize().await;
    match captured {
        Ok(stats) => info!("captured {} frames", stats.frames),
        Err(PumpError::ChannelTimeout) => {
            warn!("microphone stalled, keeping {} frames", pump.stats().frames);
        }
        Err(e) => {
            error!("capture failed: {}", e);
            return Err(e.into());
        }
    }
    let recording = finalized?;
    info!(
        "recording {}: {} bytes ({} data)",
        config.recording_path, recording.total_len, recording.data_size
    );

    let mut body = BlockStream::open(storage, config.recording_path, OpenMode::Read).await?;
    let request = UploadRequest {
        url: config.upload_url,
        headers: config.upload_headers,
        content_length: body.len(),
    };
    let posted = uploader.post(&request, &mut body).await;
    if let Err(e) = body.close().await {
        warn!("recording close failed: {}", e);
    }
    let response = match posted {
        Ok(response) => response,
        Err(e) => {
            error!("upload to {} failed: {}", config.upload_url, e);
            return Err(e.into());
        }
    };
    if response.is_success() {
        info!("transcription received: {} bytes", response.body.len());
    } else {
        warn!("upload answered with status {}", response.status);
    }

    draw_text(display, config.transcript_origin, TRANSCRIPT_STYLE, &response.body)
        .map_err(|_| FirmwareError::Display)?;

    Ok(Transcript {
        status: response.status,
        text: response.body,
        recording,
        frames: pump.stats().frames,
    })
}
