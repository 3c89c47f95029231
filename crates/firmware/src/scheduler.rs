//! Cooperative scheduler
//!
//! One loop, four gates, always in this order:
//!
//! 1. **Clock**: once per clock period, advance the wall clock and redraw
//!    the overlay.
//! 2. **Slideshow**: once per slideshow period, step to the next image and
//!    start decoding it. With `bitmap_rows_per_tick > 0` the image is drawn
//!    a slice of rows per iteration; with `0` it is drawn in one go.
//! 3. **Audio**: [`AudioScheduling::FullFile`] streams the current song to
//!    the end; [`AudioScheduling::Chunked`] moves one chunk.
//! 4. **Input**: sample the button and move the playlist cursor.
//!
//! Each gate runs to completion before the next one starts. No gate holds
//! a borrow of the context across an await of another gate.
//!
//! At most one storage stream is open at any moment. A partly drawn image
//! and a partly played song both release their handles at the end of their
//! gate and reopen at the recorded position on the next iteration.

use core::convert::Infallible;

use embassy_time::Instant;
use platform::{MomentaryInput, ReceiveChannel, RenderSink, Storage, TransmitChannel, Uploader};
use playback::{PlaybackPump, StreamState, Tick};
use ui::{BitmapError, BitmapRowDecoder, ClockOverlay};

use crate::capture::{capture_and_transcribe, Transcript};
use crate::catalog::MediaCatalog;
use crate::config::{AudioScheduling, DeviceConfig};
use crate::context::DeviceContext;
use crate::FirmwareError;

/// What the audio gate did in one iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioStep {
    /// Nothing streamed.
    #[default]
    Idle,
    /// One chunk of this many bytes went out.
    Streamed(usize),
    /// The current song reached its end.
    Finished,
    /// The current song is not on the card.
    Skipped,
    /// Storage or the channel failed; the song was abandoned.
    Failed,
}

/// What the input gate did in one iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputStep {
    /// Playlist untouched.
    #[default]
    Idle,
    /// Playlist stepped forward.
    Forward,
    /// Accepted press: playlist stepped back.
    Backward,
    /// Press ignored inside the debounce window.
    Debounced,
}

/// Report of one loop iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Iteration {
    /// Clock overlay redrawn
    pub clock_redrawn: bool,
    /// Index of the image the slideshow switched to
    pub slide_started: Option<usize>,
    /// Bitmap rows drawn
    pub rows_drawn: u32,
    /// Audio gate outcome
    pub audio: AudioStep,
    /// Input gate outcome
    pub input: InputStep,
}

/// The device main loop and everything it owns.
pub struct Scheduler<S, T, D, B>
where
    S: Storage,
    T: TransmitChannel,
    D: RenderSink,
    B: MomentaryInput,
{
    storage: S,
    speaker: T,
    display: D,
    button: B,
    config: DeviceConfig,
    catalog: MediaCatalog,
    context: DeviceContext,
    pump: PlaybackPump<S::File>,
    slide: Option<BitmapRowDecoder<S::File>>,
    clock: ClockOverlay,
}

impl<S, T, D, B> Scheduler<S, T, D, B>
where
    S: Storage,
    T: TransmitChannel,
    D: RenderSink,
    B: MomentaryInput,
{
    /// Validate `config` and take ownership of the peripherals.
    ///
    /// `storage` must already be mounted.
    pub fn new(
        storage: S,
        speaker: T,
        display: D,
        button: B,
        config: DeviceConfig,
        now: Instant,
    ) -> Result<Self, FirmwareError> {
        let catalog = config.validate()?;
        let context = DeviceContext::new(&catalog, config.initial_time, now)
            .ok_or(FirmwareError::Config(crate::ConfigError::EmptyCatalog))?;
        Ok(Self {
            pump: PlaybackPump::new(config.playback_chunk, config.channel_wait),
            clock: ClockOverlay::new(config.clock_origin),
            storage,
            speaker,
            display,
            button,
            config,
            catalog,
            context,
            slide: None,
        })
    }

    /// Draw the clock and start the first image.
    pub async fn start(&mut self) {
        self.redraw_clock();
        self.open_slide().await;
    }

    /// Run the loop forever.
    pub async fn run(&mut self) -> Infallible {
        loop {
            let report = self.run_iteration(Instant::now()).await;
            trace!("iteration: {} rows drawn, clock {}", report.rows_drawn, report.clock_redrawn);
            embassy_futures::yield_now().await;
        }
    }

    /// One pass through the four gates at time `now`.
    pub async fn run_iteration(&mut self, now: Instant) -> Iteration {
        let mut report = Iteration::default();

        let periods = self.context.clock_periods_due(now, self.config.clock_period);
        if periods > 0 {
            let seconds = self.config.clock_period.as_secs().saturating_mul(u64::from(periods));
            self.context.clock.advance(u32::try_from(seconds).unwrap_or(u32::MAX));
            report.clock_redrawn = self.redraw_clock();
        }

        if self.context.slide_due(now, self.config.slideshow_period) {
            self.context.slideshow.forward();
            report.slide_started = self.open_slide().await;
        }
        report.rows_drawn = self.render_slide().await;

        report.audio = match self.config.audio_scheduling {
            AudioScheduling::FullFile => self.play_full().await,
            AudioScheduling::Chunked => self.play_chunk().await,
        };

        report.input = self.sample_input(now).await;
        report
    }

    /// Stop playback and the slideshow, then record, finalize and upload.
    ///
    /// Only the capture stream and its re-read are open while this runs.
    pub async fn capture<R, U>(&mut self, microphone: &mut R, uploader: &mut U) -> Result<Transcript, FirmwareError>
    where
        R: ReceiveChannel,
        U: Uploader,
    {
        self.pump.stop().await;
        self.close_slide().await;
        capture_and_transcribe(&mut self.storage, microphone, uploader, &mut self.display, &self.config).await
    }

    /// Context carried between iterations.
    pub fn context(&self) -> &DeviceContext {
        &self.context
    }

    /// Active configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Playback task state.
    pub fn playback_state(&self) -> StreamState {
        self.pump.state()
    }

    /// `true` while an image is partially drawn.
    pub fn slide_in_progress(&self) -> bool {
        self.slide.is_some()
    }

    /// The render sink.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// The speaker channel.
    pub fn speaker(&self) -> &T {
        &self.speaker
    }

    /// The storage volume.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn redraw_clock(&mut self) -> bool {
        match self.clock.draw(&mut self.display, &self.context.clock) {
            Ok(()) => true,
            Err(_) => {
                warn!("clock redraw failed");
                false
            }
        }
    }

    async fn open_slide(&mut self) -> Option<usize> {
        self.close_slide().await;
        let index = self.context.slideshow.current();
        let path = self.catalog.images().path(index);
        let mut decoder =
            match BitmapRowDecoder::open(&mut self.storage, &path, &self.display, self.config.image_origin).await {
                Ok(decoder) => decoder,
                Err(BitmapError::Storage(platform::StorageError::NotFound)) => {
                    warn!("image skipped, not found: {}", path.as_str());
                    return None;
                }
                Err(e) => {
                    warn!("image {} rejected: {}", path.as_str(), e);
                    return None;
                }
            };
        if self.config.bitmap_rows_per_tick == 0 {
            if let Err(e) = decoder.render_all(&mut self.display).await {
                warn!("image {} failed: {}", path.as_str(), e);
            }
        } else {
            if let Err(e) = decoder.suspend().await {
                warn!("image {} close failed: {}", path.as_str(), e);
            }
            self.slide = Some(decoder);
        }
        Some(index)
    }

    async fn render_slide(&mut self) -> u32 {
        let Some(mut decoder) = self.slide.take() else {
            return 0;
        };
        let path = self.catalog.images().path(self.context.slideshow.current());
        if let Err(e) = decoder.resume(&mut self.storage, &path).await {
            warn!("image {} reopen failed: {}", path.as_str(), e);
            return 0;
        }
        match decoder.render_rows(&mut self.display, self.config.bitmap_rows_per_tick).await {
            Ok(rows) => {
                if !decoder.is_complete() {
                    if let Err(e) = decoder.suspend().await {
                        warn!("image {} close failed: {}", path.as_str(), e);
                    }
                    self.slide = Some(decoder);
                }
                rows
            }
            Err(e) => {
                warn!("image decode stopped: {}", e);
                0
            }
        }
    }

    async fn close_slide(&mut self) {
        if let Some(decoder) = self.slide.take() {
            if let Err(e) = decoder.close().await {
                warn!("image close failed: {}", e);
            }
        }
    }

    async fn play_full(&mut self) -> AudioStep {
        let path = self.catalog.songs().path(self.context.playlist.current());
        match self.pump.play_to_end(&mut self.storage, &path, &mut self.speaker).await {
            Ok(_) if self.pump.state() == StreamState::Done => AudioStep::Finished,
            Ok(_) => AudioStep::Skipped,
            Err(e) => {
                warn!("song {} failed: {}", path.as_str(), e);
                AudioStep::Failed
            }
        }
    }

    async fn play_chunk(&mut self) -> AudioStep {
        let step = self.tick_song().await;
        self.pump.suspend().await;
        step
    }

    async fn tick_song(&mut self) -> AudioStep {
        let path = self.catalog.songs().path(self.context.playlist.current());
        if self.pump.is_suspended() {
            if let Err(e) = self.pump.resume(&mut self.storage, &path).await {
                warn!("song {} failed to reopen: {}", path.as_str(), e);
                self.context.playlist.forward();
                return AudioStep::Failed;
            }
        } else if !matches!(self.pump.state(), StreamState::Streaming { .. }) {
            match self.pump.start(&mut self.storage, &path).await {
                Ok(true) => {}
                Ok(false) => {
                    self.context.playlist.forward();
                    return AudioStep::Skipped;
                }
                Err(e) => {
                    warn!("song {} failed to open: {}", path.as_str(), e);
                    self.context.playlist.forward();
                    return AudioStep::Failed;
                }
            }
        }
        match self.pump.tick(&mut self.speaker).await {
            Ok(Tick::Streamed(bytes)) => AudioStep::Streamed(bytes),
            Ok(Tick::Finished) => {
                self.context.playlist.forward();
                AudioStep::Finished
            }
            Ok(Tick::Idle) => AudioStep::Idle,
            Err(e) => {
                warn!("song abandoned: {}", e);
                self.context.playlist.forward();
                AudioStep::Failed
            }
        }
    }

    async fn sample_input(&mut self, now: Instant) -> InputStep {
        if self.button.is_active() {
            if !self.context.accept_press(now, self.config.debounce) {
                return InputStep::Debounced;
            }
            self.context.playlist.backward();
            if self.config.audio_scheduling == AudioScheduling::Chunked {
                self.pump.stop().await;
            }
            debug!("button: back to song {}", self.context.playlist.current());
            return InputStep::Backward;
        }
        match self.config.audio_scheduling {
            AudioScheduling::FullFile => {
                self.context.playlist.forward();
                InputStep::Forward
            }
            AudioScheduling::Chunked => InputStep::Idle,
        }
    }
}
