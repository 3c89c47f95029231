//! Playback direction: stored file → transmit channel.
//!
//! The pump is resumable. [`PlaybackPump::start`] opens a file, each
//! [`PlaybackPump::tick`] moves at most one chunk, and the pump closes the
//! file itself on end-of-stream or on any error. The cooperative scheduler
//! interleaves ticks with its other gates; [`PlaybackPump::play_to_end`]
//! keeps the run-to-completion behaviour for callers that want it.
//!
//! Between ticks the pump can hand its file handle back with
//! [`PlaybackPump::suspend`]; [`PlaybackPump::resume`] reopens the file and
//! seeks to the recorded position. A scheduler that suspends after every
//! tick never holds the song open while another gate uses storage.
//!
//! Chunks are trimmed to an even byte count before transmission. The odd
//! trailing byte of a chunk is dropped, not carried into the next one; with
//! whole-chunk reads this only ever happens on the last chunk of a file.

use platform::{BlockStream, ChannelWait, File, Storage, StorageError, TransmitChannel};

use crate::engine::{StreamState, StreamTask};
use crate::{PumpError, MAX_IDLE_TRANSFERS};

/// Largest chunk a single tick moves. The chunk buffer lives on the stack.
pub const MAX_CHUNK: usize = 4096;

/// Counters for the file currently (or last) streamed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PumpStats {
    /// Bytes read from storage
    pub bytes_read: u64,
    /// Bytes accepted by the channel
    pub bytes_transmitted: u64,
    /// Odd trailing bytes discarded by chunk trimming
    pub odd_bytes_dropped: u32,
    /// Transmit calls that consumed only part of what was offered
    pub short_transfers: u32,
}

/// Outcome of one [`PlaybackPump::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tick {
    /// Nothing to do: no file in progress.
    Idle,
    /// One chunk was transmitted (byte count after trimming).
    Streamed(usize),
    /// End-of-stream was reached; the file is closed.
    Finished,
}

/// Resumable storage → channel pump.
pub struct PlaybackPump<F: File> {
    task: StreamTask,
    stream: Option<BlockStream<F>>,
    chunk: usize,
    wait: ChannelWait,
    stats: PumpStats,
}

impl<F: File> PlaybackPump<F> {
    /// Create an idle pump. `chunk` is clamped to `2..=MAX_CHUNK` and
    /// rounded down to an even size.
    pub fn new(chunk: usize, wait: ChannelWait) -> Self {
        Self {
            task: StreamTask::new(),
            stream: None,
            chunk: chunk.clamp(2, MAX_CHUNK) & !1,
            wait,
            stats: PumpStats::default(),
        }
    }

    /// Open `path` and begin streaming it from offset 0.
    ///
    /// Any file already in progress is closed first. A missing file is not
    /// an error: the pump logs it, stays idle and returns `Ok(false)`.
    pub async fn start<S>(&mut self, storage: &mut S, path: &str) -> Result<bool, PumpError>
    where
        S: Storage<File = F>,
    {
        self.stop().await;
        self.stats = PumpStats::default();
        match BlockStream::open(storage, path, platform::OpenMode::Read).await {
            Ok(stream) => {
                debug!("playback start: {} ({} bytes)", path, stream.len());
                self.stream = Some(stream);
                self.task.begin();
                Ok(true)
            }
            Err(StorageError::NotFound) => {
                warn!("playback skipped, not found: {}", path);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Release the file handle but keep the position.
    ///
    /// The pump stays `Streaming`; [`resume`](Self::resume) must run before
    /// the next [`tick`](Self::tick).
    pub async fn suspend(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close().await {
                warn!("playback suspend close failed: {}", e);
            }
        }
    }

    /// `true` while streaming with the file handle released.
    pub fn is_suspended(&self) -> bool {
        self.task.is_streaming() && self.stream.is_none()
    }

    /// Reopen `path` and seek to where the last tick stopped.
    ///
    /// A no-op unless the pump is suspended. If the file can no longer be
    /// opened or positioned, the pump drops back to `Idle`.
    pub async fn resume<S>(&mut self, storage: &mut S, path: &str) -> Result<(), PumpError>
    where
        S: Storage<File = F>,
    {
        let Some(position) = self.task.position() else {
            return Ok(());
        };
        if self.stream.is_some() {
            return Ok(());
        }
        let mut stream = match BlockStream::open(storage, path, platform::OpenMode::Read).await {
            Ok(stream) => stream,
            Err(e) => {
                self.task.reset();
                return Err(e.into());
            }
        };
        if let Err(e) = stream.seek(position).await {
            if let Err(close) = stream.close().await {
                warn!("playback close failed: {}", close);
            }
            self.task.reset();
            return Err(e.into());
        }
        trace!("playback resumed: {} at {}", path, position);
        self.stream = Some(stream);
        Ok(())
    }

    /// Transmit at most one chunk of the current file.
    pub async fn tick<C: TransmitChannel>(&mut self, channel: &mut C) -> Result<Tick, PumpError> {
        if !self.task.is_streaming() {
            return Ok(Tick::Idle);
        }
        let Some(stream) = self.stream.as_mut() else {
            self.task.reset();
            return Err(PumpError::NotStreaming);
        };

        let mut buf = [0u8; MAX_CHUNK];
        let chunk = buf.get_mut(..self.chunk).unwrap_or_default();
        let read = match stream.read_full(chunk).await {
            Ok(n) => n,
            Err(e) => {
                self.abort().await;
                return Err(e.into());
            }
        };
        if read == 0 {
            self.finish().await?;
            return Ok(Tick::Finished);
        }
        self.stats.bytes_read = self.stats.bytes_read.saturating_add(read as u64);

        let even = read & !1;
        if even != read {
            self.stats.odd_bytes_dropped = self.stats.odd_bytes_dropped.saturating_add(1);
            trace!("dropped odd trailing byte of a {} byte chunk", read);
        }
        let payload = chunk.get(..even).unwrap_or_default();
        if let Err(e) = transmit_all(channel, payload, self.wait, &mut self.stats).await {
            warn!("playback aborted: {}", e);
            self.abort().await;
            return Err(e);
        }
        self.task.advance(read as u64)?;
        Ok(Tick::Streamed(even))
    }

    /// Stream `path` start to finish (the blocking, reference behaviour).
    ///
    /// Returns the statistics of the pass; a missing file yields all-zero
    /// statistics.
    pub async fn play_to_end<S, C>(
        &mut self,
        storage: &mut S,
        path: &str,
        channel: &mut C,
    ) -> Result<PumpStats, PumpError>
    where
        S: Storage<File = F>,
        C: TransmitChannel,
    {
        if !self.start(storage, path).await? {
            return Ok(self.stats);
        }
        while let Tick::Streamed(_) = self.tick(channel).await? {}
        Ok(self.stats)
    }

    /// Close the current file, if any, and go idle.
    pub async fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close().await {
                warn!("playback close failed: {}", e);
            }
        }
        self.task.reset();
    }

    /// Current task state.
    pub fn state(&self) -> StreamState {
        self.task.state()
    }

    /// Counters for the current or last file.
    pub fn stats(&self) -> PumpStats {
        self.stats
    }

    async fn finish(&mut self) -> Result<(), PumpError> {
        let position = self.task.finish()?;
        if let Some(mut stream) = self.stream.take() {
            stream.close().await?;
        }
        info!(
            "playback done: {} bytes read, {} transmitted",
            position, self.stats.bytes_transmitted
        );
        Ok(())
    }

    async fn abort(&mut self) {
        self.stop().await;
    }
}

/// Offer `buf` to `channel` until every byte is consumed.
///
/// Each call is bounded by `wait`. A channel that accepts nothing for
/// [`MAX_IDLE_TRANSFERS`] consecutive calls counts as timed out.
pub async fn transmit_all<C: TransmitChannel>(
    channel: &mut C,
    mut buf: &[u8],
    wait: ChannelWait,
    stats: &mut PumpStats,
) -> Result<(), PumpError> {
    let mut idle = 0u32;
    while !buf.is_empty() {
        let sent = wait
            .apply(channel.transmit(buf))
            .await
            .map_err(|_| PumpError::ChannelTimeout)??;
        if sent == 0 {
            idle = idle.saturating_add(1);
            if idle >= MAX_IDLE_TRANSFERS {
                return Err(PumpError::ChannelTimeout);
            }
            embassy_futures::yield_now().await;
            continue;
        }
        idle = 0;
        if sent < buf.len() {
            stats.short_transfers = stats.short_transfers.saturating_add(1);
        }
        stats.bytes_transmitted = stats.bytes_transmitted.saturating_add(sent as u64);
        buf = buf.get(sent..).unwrap_or_default();
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use embassy_time::Duration;
    use platform::mocks::{pcm_config, MemFile, MemStorage, MockTransmitter};

    fn pump(chunk: usize) -> PlaybackPump<MemFile> {
        PlaybackPump::new(chunk, ChannelWait::Bounded(Duration::from_millis(50)))
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[tokio::test]
    async fn streams_whole_file_in_order() {
        let mut storage = MemStorage::new();
        let data = pattern(10_000);
        storage.insert("/songs/song1.wav", &data);
        let mut tx = MockTransmitter::new(pcm_config(44_100, 16, 2));
        let mut p = pump(4096);
        let stats = p.play_to_end(&mut storage, "/songs/song1.wav", &mut tx).await.unwrap();
        assert_eq!(tx.accepted(), &data[..]);
        assert_eq!(stats.bytes_read, 10_000);
        assert_eq!(stats.bytes_transmitted, 10_000);
        assert_eq!(p.state(), StreamState::Done);
        assert_eq!(storage.open_count(), 0);
    }

    #[tokio::test]
    async fn one_chunk_per_tick() {
        let mut storage = MemStorage::new();
        storage.insert("/a.wav", &pattern(5000));
        let mut tx = MockTransmitter::new(pcm_config(44_100, 16, 2));
        let mut p = pump(4096);
        assert!(p.start(&mut storage, "/a.wav").await.unwrap());
        assert_eq!(p.tick(&mut tx).await.unwrap(), Tick::Streamed(4096));
        assert_eq!(p.state(), StreamState::Streaming { position: 4096 });
        assert_eq!(p.tick(&mut tx).await.unwrap(), Tick::Streamed(904));
        assert_eq!(p.tick(&mut tx).await.unwrap(), Tick::Finished);
        assert_eq!(p.tick(&mut tx).await.unwrap(), Tick::Idle);
    }

    #[tokio::test]
    async fn odd_tail_byte_is_dropped_and_counted() {
        let mut storage = MemStorage::new();
        let data = pattern(4097 + 4096 + 3);
        storage.insert("/odd.wav", &data);
        let mut tx = MockTransmitter::new(pcm_config(16_000, 16, 1));
        let mut p = pump(4096);
        let stats = p.play_to_end(&mut storage, "/odd.wav", &mut tx).await.unwrap();
        assert_eq!(stats.odd_bytes_dropped, 1);
        assert_eq!(tx.accepted().len(), data.len() - 1);
        assert_eq!(tx.accepted(), &data[..data.len() - 1]);
    }

    #[tokio::test]
    async fn partial_transmits_are_retried() {
        let mut storage = MemStorage::new();
        let data = pattern(3000);
        storage.insert("/p.wav", &data);
        let mut tx = MockTransmitter::new(pcm_config(16_000, 16, 1)).with_max_per_call(700);
        let mut p = pump(1024);
        let stats = p.play_to_end(&mut storage, "/p.wav", &mut tx).await.unwrap();
        assert_eq!(tx.accepted(), &data[..]);
        assert!(stats.short_transfers > 0);
    }

    #[tokio::test]
    async fn short_storage_reads_still_fill_chunks() {
        let mut storage = MemStorage::new().with_read_limit(5);
        let data = pattern(64);
        storage.insert("/s.wav", &data);
        let mut tx = MockTransmitter::new(pcm_config(16_000, 16, 1));
        let mut p = pump(32);
        let stats = p.play_to_end(&mut storage, "/s.wav", &mut tx).await.unwrap();
        assert_eq!(stats.odd_bytes_dropped, 0);
        assert_eq!(tx.accepted(), &data[..]);
    }

    #[tokio::test]
    async fn missing_file_is_silent_noop() {
        let mut storage = MemStorage::new();
        let mut tx = MockTransmitter::new(pcm_config(16_000, 16, 1));
        let mut p = pump(4096);
        let stats = p.play_to_end(&mut storage, "/songs/song9.wav", &mut tx).await.unwrap();
        assert_eq!(stats, PumpStats::default());
        assert_eq!(tx.calls(), 0);
        assert_eq!(p.state(), StreamState::Idle);
    }

    #[tokio::test]
    async fn stalled_channel_times_out_and_closes() {
        let mut storage = MemStorage::new();
        storage.insert("/t.wav", &pattern(8192));
        let mut tx = MockTransmitter::new(pcm_config(16_000, 16, 1)).stall_after(1);
        let mut p = pump(4096);
        assert!(p.start(&mut storage, "/t.wav").await.unwrap());
        assert_eq!(p.tick(&mut tx).await.unwrap(), Tick::Streamed(4096));
        assert_eq!(p.tick(&mut tx).await, Err(PumpError::ChannelTimeout));
        assert_eq!(p.state(), StreamState::Idle);
        assert_eq!(storage.open_count(), 0);
    }

    #[tokio::test]
    async fn zero_progress_channel_times_out() {
        let mut storage = MemStorage::new();
        storage.insert("/z.wav", &pattern(16));
        let mut tx = MockTransmitter::new(pcm_config(16_000, 16, 1)).with_max_per_call(0);
        let mut p = pump(16);
        let result = p.play_to_end(&mut storage, "/z.wav", &mut tx).await;
        assert_eq!(result, Err(PumpError::ChannelTimeout));
        assert_eq!(tx.calls(), MAX_IDLE_TRANSFERS as usize);
    }

    #[tokio::test]
    async fn restart_streams_from_offset_zero() {
        let mut storage = MemStorage::new();
        let data = pattern(100);
        storage.insert("/r.wav", &data);
        let mut tx = MockTransmitter::new(pcm_config(16_000, 16, 1));
        let mut p = pump(64);
        p.start(&mut storage, "/r.wav").await.unwrap();
        p.tick(&mut tx).await.unwrap();
        p.start(&mut storage, "/r.wav").await.unwrap();
        assert_eq!(storage.open_count(), 1);
        p.tick(&mut tx).await.unwrap();
        assert_eq!(&tx.accepted()[64..], &data[..64]);
    }

    #[tokio::test]
    async fn suspended_pump_resumes_where_it_stopped() {
        let mut storage = MemStorage::new();
        let data = pattern(3000);
        storage.insert("/q.wav", &data);
        let mut tx = MockTransmitter::new(pcm_config(16_000, 16, 1));
        let mut p = pump(1024);
        p.start(&mut storage, "/q.wav").await.unwrap();
        p.tick(&mut tx).await.unwrap();
        p.suspend().await;
        assert!(p.is_suspended());
        assert_eq!(storage.open_count(), 0);
        assert_eq!(p.state(), StreamState::Streaming { position: 1024 });

        p.resume(&mut storage, "/q.wav").await.unwrap();
        assert_eq!(storage.open_count(), 1);
        while let Tick::Streamed(_) = p.tick(&mut tx).await.unwrap() {
            p.suspend().await;
            p.resume(&mut storage, "/q.wav").await.unwrap();
        }
        assert_eq!(tx.accepted(), &data[..]);
        assert_eq!(storage.open_count(), 0);
    }

    #[tokio::test]
    async fn resume_of_a_vanished_file_goes_idle() {
        let mut storage = MemStorage::new();
        storage.insert("/v.wav", &pattern(2048));
        let mut tx = MockTransmitter::new(pcm_config(16_000, 16, 1));
        let mut p = pump(1024);
        p.start(&mut storage, "/v.wav").await.unwrap();
        p.tick(&mut tx).await.unwrap();
        p.suspend().await;
        let result = p.resume(&mut storage, "/gone.wav").await;
        assert_eq!(result, Err(PumpError::Storage(StorageError::NotFound)));
        assert_eq!(p.state(), StreamState::Idle);
    }

    #[test]
    fn chunk_size_is_even_and_bounded() {
        assert_eq!(pump(4097).chunk, 4096);
        assert_eq!(pump(1023).chunk, 1022);
        assert_eq!(pump(0).chunk, 2);
    }

    proptest::proptest! {
        /// Every trimmed chunk goes out in full, whatever the file length and
        /// however the channel splits it.
        #[test]
        fn trimmed_chunks_are_transmitted_in_full(len in 0usize..9000, limit in 1usize..5000) {
            let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
            rt.block_on(async {
                let mut storage = MemStorage::new();
                let data = pattern(len);
                storage.insert("/x.wav", &data);
                let mut tx = MockTransmitter::new(pcm_config(16_000, 16, 1)).with_max_per_call(limit);
                let mut p = pump(4096);
                let stats = p.play_to_end(&mut storage, "/x.wav", &mut tx).await.unwrap();
                let expected = len - (len % 4096) % 2;
                assert_eq!(tx.accepted().len(), expected);
                assert_eq!(stats.bytes_transmitted, expected as u64);
                assert_eq!(stats.odd_bytes_dropped as usize, (len % 4096) % 2);
            });
        }
    }
}
