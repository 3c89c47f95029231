//! Desktop stand-ins for the device peripherals.
//!
//! The emulator binary pairs these with
//! [`LocalFileStorage`](platform::storage_local::LocalFileStorage): audio
//! channels are paced in real time by the embassy std timer, the panel
//! logs what it is asked to draw and the uploader answers locally.

use core::convert::Infallible;
use core::fmt::Write;

use embassy_time::{Duration, Timer};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;
use platform::network::RESPONSE_CAPACITY;
use platform::{
    BlockStream, ChannelConfig, ChannelError, File, HardwareChannel, MomentaryInput, ReceiveChannel, RenderSink,
    TransmitChannel, UploadError, UploadRequest, UploadResponse, Uploader,
};

/// Bytes one DMA half-buffer holds.
pub const FIFO_BYTES: usize = 2048;

fn transfer_time(config: &ChannelConfig, bytes: usize) -> Duration {
    let per_second = u64::from(config.bytes_per_second());
    let micros = (bytes as u64).saturating_mul(1_000_000).checked_div(per_second).unwrap_or(0);
    Duration::from_micros(micros)
}

/// Speaker that consumes at most one FIFO per call, at the sample rate.
pub struct PacedSpeaker {
    config: ChannelConfig,
    played: u64,
}

impl PacedSpeaker {
    /// Speaker running at `config`.
    pub fn new(config: ChannelConfig) -> Self {
        Self { config, played: 0 }
    }

    /// Bytes played so far.
    pub fn played(&self) -> u64 {
        self.played
    }
}

impl HardwareChannel for PacedSpeaker {
    fn config(&self) -> ChannelConfig {
        self.config
    }
}

impl TransmitChannel for PacedSpeaker {
    async fn transmit(&mut self, buf: &[u8]) -> Result<usize, ChannelError> {
        let n = buf.len().min(FIFO_BYTES);
        Timer::after(transfer_time(&self.config, n)).await;
        self.played = self.played.saturating_add(n as u64);
        Ok(n)
    }
}

/// Microphone that records silence at the sample rate.
pub struct SilentMicrophone {
    config: ChannelConfig,
}

impl SilentMicrophone {
    /// Microphone running at `config`.
    pub fn new(config: ChannelConfig) -> Self {
        Self { config }
    }
}

impl HardwareChannel for SilentMicrophone {
    fn config(&self) -> ChannelConfig {
        self.config
    }
}

impl ReceiveChannel for SilentMicrophone {
    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError> {
        let n = buf.len().min(FIFO_BYTES);
        Timer::after(transfer_time(&self.config, n)).await;
        buf.iter_mut().take(n).for_each(|b| *b = 0);
        Ok(n)
    }
}

/// Panel that logs text and counts pixels.
pub struct LogDisplay {
    size: Size,
    cursor: Point,
    pixels: u64,
}

impl LogDisplay {
    /// Panel of `width`×`height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            cursor: Point::zero(),
            pixels: 0,
        }
    }

    /// Pixels drawn so far.
    pub fn pixels(&self) -> u64 {
        self.pixels
    }
}

impl RenderSink for LogDisplay {
    type Error = Infallible;

    fn size(&self) -> Size {
        self.size
    }

    fn set_addr_window(&mut self, area: Rectangle) -> Result<(), Self::Error> {
        tracing::debug!(x = area.top_left.x, y = area.top_left.y, w = area.size.width, h = area.size.height, "window");
        Ok(())
    }

    fn draw_pixel(&mut self, _at: Point, _color: Rgb565) -> Result<(), Self::Error> {
        self.pixels = self.pixels.saturating_add(1);
        Ok(())
    }

    fn fill_rect(&mut self, _area: Rectangle, _color: Rgb565) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_cursor(&mut self, at: Point) {
        self.cursor = at;
    }

    fn set_text_color(&mut self, _color: Rgb565) {}

    fn set_text_size(&mut self, _scale: u8) {}

    fn print(&mut self, text: &str) -> Result<(), Self::Error> {
        tracing::info!(x = self.cursor.x, y = self.cursor.y, "display: {}", text);
        Ok(())
    }
}

/// Button that is never pressed.
#[derive(Debug, Default)]
pub struct IdleButton;

impl MomentaryInput for IdleButton {
    fn is_active(&mut self) -> bool {
        false
    }
}

/// Uploader that reads the whole body and answers with its size.
#[derive(Debug, Default)]
pub struct LoopbackUploader;

impl Uploader for LoopbackUploader {
    async fn post<F: File>(
        &mut self,
        request: &UploadRequest<'_>,
        body: &mut BlockStream<F>,
    ) -> Result<UploadResponse, UploadError> {
        let mut chunk = [0u8; 1024];
        let mut sent = 0u64;
        loop {
            let n = body.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            sent = sent.saturating_add(n as u64);
        }
        tracing::info!(url = request.url, bytes = sent, "loopback upload");
        let mut text: heapless::String<RESPONSE_CAPACITY> = heapless::String::new();
        let _ = write!(text, "(emulator) {sent} of {} bytes heard", request.content_length);
        Ok(UploadResponse { status: 200, body: text })
    }
}
