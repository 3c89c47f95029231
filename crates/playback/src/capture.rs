//! Capture direction: receive channel → PCM sink.
//!
//! The pump asks the channel for `min(chunk, remaining)` bytes on every call
//! and counts what actually arrived, so a capture of `n` frames stops at
//! exactly `n` frames however the driver splits its transfers.

use platform::{BlockStream, ChannelWait, File, ReceiveChannel};

use crate::engine::{StreamState, StreamTask};
use crate::wav::WavWriter;
use crate::{PumpError, MAX_IDLE_TRANSFERS};

/// Largest chunk requested from the channel in one call.
pub const MAX_CHUNK: usize = 4096;

/// Where captured PCM bytes go.
pub trait PcmSink {
    /// Append every byte of `bytes`.
    fn write_pcm(&mut self, bytes: &[u8]) -> impl core::future::Future<Output = Result<(), PumpError>>;
}

impl<F: File> PcmSink for BlockStream<F> {
    async fn write_pcm(&mut self, bytes: &[u8]) -> Result<(), PumpError> {
        self.write_all(bytes).await.map_err(PumpError::from)
    }
}

impl<F: File> PcmSink for WavWriter<F> {
    async fn write_pcm(&mut self, bytes: &[u8]) -> Result<(), PumpError> {
        self.append(bytes).await.map_err(PumpError::from)
    }
}

/// Progress of the current or last capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CaptureStats {
    /// Bytes handed to the sink
    pub bytes: u64,
    /// Whole frames handed to the sink
    pub frames: u64,
    /// Receive calls that produced less than requested
    pub short_reads: u32,
}

/// Channel → sink pump with an exact frame target.
pub struct CapturePump {
    task: StreamTask,
    chunk: usize,
    wait: ChannelWait,
    stats: CaptureStats,
}

impl CapturePump {
    /// Create an idle pump. `chunk` is clamped to `1..=MAX_CHUNK`.
    pub fn new(chunk: usize, wait: ChannelWait) -> Self {
        Self {
            task: StreamTask::new(),
            chunk: chunk.clamp(1, MAX_CHUNK),
            wait,
            stats: CaptureStats::default(),
        }
    }

    /// Capture `seconds` of audio at the channel's own format.
    pub async fn record<C, S>(
        &mut self,
        channel: &mut C,
        sink: &mut S,
        seconds: u32,
    ) -> Result<CaptureStats, PumpError>
    where
        C: ReceiveChannel,
        S: PcmSink,
    {
        let rate = u64::from(channel.config().sample_rate.get());
        let frames = rate.saturating_mul(u64::from(seconds));
        self.record_frames(channel, sink, frames).await
    }

    /// Capture exactly `frames` frames.
    ///
    /// On error the statistics still describe what reached the sink; read
    /// them back with [`stats`](Self::stats).
    pub async fn record_frames<C, S>(
        &mut self,
        channel: &mut C,
        sink: &mut S,
        frames: u64,
    ) -> Result<CaptureStats, PumpError>
    where
        C: ReceiveChannel,
        S: PcmSink,
    {
        let frame_bytes = u64::from(channel.config().bytes_per_frame()).max(1);
        let target = frames.saturating_mul(frame_bytes);
        self.stats = CaptureStats::default();
        self.task.begin();
        debug!("capture start: {} frames, {} bytes", frames, target);

        let mut buf = [0u8; MAX_CHUNK];
        let mut idle = 0u32;
        let mut captured = 0u64;
        while captured < target {
            let remaining = target.saturating_sub(captured);
            let want = usize::try_from(remaining).map_or(self.chunk, |r| r.min(self.chunk));
            let slot = buf.get_mut(..want).unwrap_or_default();
            let got = match self.wait.apply(channel.receive(slot)).await {
                Ok(Ok(n)) => n.min(want),
                Ok(Err(e)) => return Err(self.fail(e.into())),
                Err(_) => return Err(self.fail(PumpError::ChannelTimeout)),
            };
            if got == 0 {
                idle = idle.saturating_add(1);
                if idle >= MAX_IDLE_TRANSFERS {
                    return Err(self.fail(PumpError::ChannelTimeout));
                }
                embassy_futures::yield_now().await;
                continue;
            }
            idle = 0;
            if got < want {
                self.stats.short_reads = self.stats.short_reads.saturating_add(1);
            }
            if let Err(e) = sink.write_pcm(slot.get(..got).unwrap_or_default()).await {
                return Err(self.fail(e));
            }
            captured = captured.saturating_add(got as u64);
            self.stats.bytes = captured;
            self.stats.frames = captured.checked_div(frame_bytes).unwrap_or(0);
            self.task.advance(got as u64)?;
        }
        self.task.finish()?;
        info!("capture done: {} frames", self.stats.frames);
        Ok(self.stats)
    }

    /// Progress of the current or last capture.
    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Current task state.
    pub fn state(&self) -> StreamState {
        self.task.state()
    }

    fn fail(&mut self, e: PumpError) -> PumpError {
        warn!("capture stopped after {} bytes: {}", self.stats.bytes, e);
        self.task.reset();
        e
    }
}
