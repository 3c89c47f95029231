//! Mock implementations for testing
//!
//! This module provides in-process implementations of all platform traits
//! for use in unit and integration tests and in the desktop emulator.
//! Each mock records what it was asked to do and can inject the failure
//! modes real hardware shows: short transfers, stalls, full volumes.

// Host-only test doubles: bounds are checked by the surrounding logic.
#![allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]

use core::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;

use crate::audio::{ChannelConfig, ChannelError, HardwareChannel, ReceiveChannel, TransmitChannel};
use crate::audio_types::{BitDepth, ChannelCount, SampleRateHz};
use crate::block_stream::BlockStream;
use crate::display::RenderSink;
use crate::input::MomentaryInput;
use crate::network::{UploadError, UploadRequest, UploadResponse, Uploader};
use crate::storage::{File, OpenMode, Storage, StorageError};

/// Build a channel format from raw numbers. Panics on invalid values.
#[allow(clippy::expect_used)] // test fixture: callers pass literal, valid formats
pub fn pcm_config(sample_rate: u32, bits: u16, channels: u8) -> ChannelConfig {
    ChannelConfig {
        sample_rate: SampleRateHz::new(sample_rate).expect("valid sample rate"),
        bit_depth: BitDepth::from_bits(bits).expect("valid bit depth"),
        channels: ChannelCount::new(channels).expect("valid channel count"),
    }
}

// ── Storage ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemVolume {
    files: BTreeMap<String, Vec<u8>>,
    unmounted: bool,
    capacity: Option<usize>,
    read_limit: Option<usize>,
    seeks: usize,
    open: usize,
    peak_open: usize,
}

impl MemVolume {
    fn used(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

/// In-memory volume. Clones share the same files.
#[derive(Clone, Default)]
pub struct MemStorage {
    volume: Rc<RefCell<MemVolume>>,
}

impl MemStorage {
    /// Create an empty, mounted, unlimited volume.
    pub fn new() -> Self {
        Self::default()
    }

    /// A volume whose `mount` fails (card missing).
    pub fn unmounted() -> Self {
        let storage = Self::new();
        storage.volume.borrow_mut().unmounted = true;
        storage
    }

    /// A volume that holds at most `bytes` across all files.
    pub fn with_capacity(bytes: usize) -> Self {
        let storage = Self::new();
        storage.volume.borrow_mut().capacity = Some(bytes);
        storage
    }

    /// Cap every driver read at `bytes`, forcing callers through short reads.
    #[must_use]
    pub fn with_read_limit(self, bytes: usize) -> Self {
        self.volume.borrow_mut().read_limit = Some(bytes.max(1));
        self
    }

    /// Create or replace `path`.
    pub fn insert(&self, path: &str, bytes: &[u8]) {
        self.volume
            .borrow_mut()
            .files
            .insert(path.to_string(), bytes.to_vec());
    }

    /// Current content of `path`.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.volume.borrow().files.get(path).cloned()
    }

    /// Seeks that reached the driver since creation.
    pub fn seek_count(&self) -> usize {
        self.volume.borrow().seeks
    }

    /// Handles currently open.
    pub fn open_count(&self) -> usize {
        self.volume.borrow().open
    }

    /// Most handles ever open at the same time.
    pub fn peak_open_count(&self) -> usize {
        self.volume.borrow().peak_open
    }
}

/// Handle onto one [`MemStorage`] object.
pub struct MemFile {
    volume: Rc<RefCell<MemVolume>>,
    path: String,
    pos: usize,
}

impl Drop for MemFile {
    fn drop(&mut self) {
        let mut volume = self.volume.borrow_mut();
        volume.open = volume.open.saturating_sub(1);
    }
}

impl File for MemFile {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        let volume = self.volume.borrow();
        let data = volume.files.get(&self.path).ok_or(StorageError::Read)?;
        let available = data.get(self.pos..).unwrap_or(&[]);
        let mut n = available.len().min(buf.len());
        if let Some(limit) = volume.read_limit {
            n = n.min(limit);
        }
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, StorageError> {
        let mut volume = self.volume.borrow_mut();
        let used = volume.used();
        let capacity = volume.capacity;
        let file = volume.files.entry(self.path.clone()).or_default();
        let end = self.pos + buf.len();
        let growth = end.saturating_sub(file.len().max(self.pos));
        let pad = self.pos.saturating_sub(file.len());
        let n = match capacity {
            Some(cap) => {
                let room = cap.saturating_sub(used + pad);
                buf.len() - growth.saturating_sub(room)
            }
            None => buf.len(),
        };
        if n == 0 && !buf.is_empty() {
            return Err(StorageError::Write);
        }
        if file.len() < self.pos {
            file.resize(self.pos, 0);
        }
        let overlap = (file.len() - self.pos).min(n);
        file[self.pos..self.pos + overlap].copy_from_slice(&buf[..overlap]);
        file.extend_from_slice(&buf[overlap..n]);
        self.pos += n;
        Ok(n)
    }

    async fn seek(&mut self, pos: u64) -> Result<u64, StorageError> {
        let pos_usize = usize::try_from(pos).map_err(|_| StorageError::Seek)?;
        self.volume.borrow_mut().seeks += 1;
        self.pos = pos_usize;
        Ok(pos)
    }

    async fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    fn size(&self) -> u64 {
        self.volume
            .borrow()
            .files
            .get(&self.path)
            .map_or(0, |f| f.len() as u64)
    }
}

impl Storage for MemStorage {
    type File = MemFile;

    async fn mount(&mut self) -> Result<(), StorageError> {
        if self.volume.borrow().unmounted {
            Err(StorageError::NotMounted)
        } else {
            Ok(())
        }
    }

    async fn open_file(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, StorageError> {
        let mut volume = self.volume.borrow_mut();
        if volume.unmounted {
            return Err(StorageError::NotMounted);
        }
        match mode {
            OpenMode::Read if !volume.files.contains_key(path) => {
                return Err(StorageError::NotFound);
            }
            OpenMode::Read => {}
            OpenMode::Write => {
                volume.files.insert(path.to_string(), Vec::new());
            }
        }
        volume.open += 1;
        volume.peak_open = volume.peak_open.max(volume.open);
        Ok(MemFile {
            volume: Rc::clone(&self.volume),
            path: path.to_string(),
            pos: 0,
        })
    }

    async fn exists(&mut self, path: &str) -> Result<bool, StorageError> {
        Ok(self.volume.borrow().files.contains_key(path))
    }
}

// ── Audio channels ──────────────────────────────────────────────────────────

/// Transmit channel that records every byte it accepts.
pub struct MockTransmitter {
    config: ChannelConfig,
    accepted: Vec<u8>,
    max_per_call: usize,
    calls: usize,
    stall_after: Option<usize>,
}

impl MockTransmitter {
    /// Accept everything offered, immediately.
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            accepted: Vec::new(),
            max_per_call: usize::MAX,
            calls: 0,
            stall_after: None,
        }
    }

    /// Accept at most `bytes` per call (partial transmissions).
    #[must_use]
    pub fn with_max_per_call(mut self, bytes: usize) -> Self {
        self.max_per_call = bytes;
        self
    }

    /// Never complete any call after the first `calls`.
    #[must_use]
    pub fn stall_after(mut self, calls: usize) -> Self {
        self.stall_after = Some(calls);
        self
    }

    /// Bytes accepted so far, in order.
    pub fn accepted(&self) -> &[u8] {
        &self.accepted
    }

    /// Number of `transmit` calls made.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl HardwareChannel for MockTransmitter {
    fn config(&self) -> ChannelConfig {
        self.config
    }
}

impl TransmitChannel for MockTransmitter {
    async fn transmit(&mut self, buf: &[u8]) -> Result<usize, ChannelError> {
        self.calls += 1;
        if self.stall_after.is_some_and(|limit| self.calls > limit) {
            core::future::pending::<()>().await;
        }
        let n = buf.len().min(self.max_per_call);
        self.accepted.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

/// What a [`MockReceiver`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// All-zero samples.
    Silence,
    /// Byte `i` of the capture is `i as u8`.
    Ramp,
}

/// Receive channel that synthesizes a signal.
pub struct MockReceiver {
    config: ChannelConfig,
    signal: Signal,
    produced: u64,
    max_per_call: usize,
    calls: usize,
    stall_after: Option<usize>,
}

impl MockReceiver {
    /// Fill every request completely.
    pub fn new(config: ChannelConfig, signal: Signal) -> Self {
        Self {
            config,
            signal,
            produced: 0,
            max_per_call: usize::MAX,
            calls: 0,
            stall_after: None,
        }
    }

    /// Produce at most `bytes` per call (partial reads).
    #[must_use]
    pub fn with_max_per_call(mut self, bytes: usize) -> Self {
        self.max_per_call = bytes;
        self
    }

    /// Never complete any call after the first `calls`.
    #[must_use]
    pub fn stall_after(mut self, calls: usize) -> Self {
        self.stall_after = Some(calls);
        self
    }

    /// Total bytes handed out.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Number of `receive` calls made.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl HardwareChannel for MockReceiver {
    fn config(&self) -> ChannelConfig {
        self.config
    }
}

impl ReceiveChannel for MockReceiver {
    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError> {
        self.calls += 1;
        if self.stall_after.is_some_and(|limit| self.calls > limit) {
            core::future::pending::<()>().await;
        }
        let n = buf.len().min(self.max_per_call);
        for (i, slot) in buf[..n].iter_mut().enumerate() {
            *slot = match self.signal {
                Signal::Silence => 0,
                #[allow(clippy::cast_possible_truncation)] // ramp wraps by design
                Signal::Ramp => (self.produced + i as u64) as u8,
            };
        }
        self.produced += n as u64;
        Ok(n)
    }
}

// ── Render sink ─────────────────────────────────────────────────────────────

/// Render sink that remembers the last color of every pixel and every call.
pub struct MockRenderSink {
    size: Size,
    pixels: BTreeMap<(i32, i32), Rgb565>,
    draw_log: Vec<(Point, Rgb565)>,
    windows: Vec<Rectangle>,
    fills: Vec<(Rectangle, Rgb565)>,
    printed: Vec<(Point, String)>,
    cursor: Point,
    text_color: Rgb565,
    text_size: u8,
}

impl MockRenderSink {
    /// A blank panel of `width` × `height`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            pixels: BTreeMap::new(),
            draw_log: Vec::new(),
            windows: Vec::new(),
            fills: Vec::new(),
            printed: Vec::new(),
            cursor: Point::zero(),
            text_color: Rgb565::new(31, 63, 31),
            text_size: 1,
        }
    }

    /// Last color drawn at `(x, y)`.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb565> {
        self.pixels.get(&(x, y)).copied()
    }

    /// Every `draw_pixel` call, in order.
    pub fn draw_log(&self) -> &[(Point, Rgb565)] {
        &self.draw_log
    }

    /// Every address window set, in order.
    pub fn windows(&self) -> &[Rectangle] {
        &self.windows
    }

    /// Every `fill_rect` call, in order.
    pub fn fills(&self) -> &[(Rectangle, Rgb565)] {
        &self.fills
    }

    /// Every printed string with the cursor it started at.
    pub fn printed(&self) -> &[(Point, String)] {
        &self.printed
    }

    /// Current text color.
    pub fn text_color(&self) -> Rgb565 {
        self.text_color
    }

    /// Current text scale.
    pub fn text_size(&self) -> u8 {
        self.text_size
    }
}

impl RenderSink for MockRenderSink {
    type Error = core::convert::Infallible;

    fn size(&self) -> Size {
        self.size
    }

    fn set_addr_window(&mut self, area: Rectangle) -> Result<(), Self::Error> {
        self.windows.push(area);
        Ok(())
    }

    fn draw_pixel(&mut self, at: Point, color: Rgb565) -> Result<(), Self::Error> {
        self.pixels.insert((at.x, at.y), color);
        self.draw_log.push((at, color));
        Ok(())
    }

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        self.fills.push((area, color));
        Ok(())
    }

    fn set_cursor(&mut self, at: Point) {
        self.cursor = at;
    }

    fn set_text_color(&mut self, color: Rgb565) {
        self.text_color = color;
    }

    fn set_text_size(&mut self, scale: u8) {
        self.text_size = scale;
    }

    fn print(&mut self, text: &str) -> Result<(), Self::Error> {
        self.printed.push((self.cursor, text.to_string()));
        Ok(())
    }
}

// ── Input ───────────────────────────────────────────────────────────────────

/// Button that replays a script of samples, then reports `idle`.
pub struct MockButton {
    script: VecDeque<bool>,
    idle: bool,
}

impl MockButton {
    /// Never pressed.
    pub fn released() -> Self {
        Self {
            script: VecDeque::new(),
            idle: false,
        }
    }

    /// Replay `samples` in order, then stay released.
    pub fn scripted(samples: &[bool]) -> Self {
        Self {
            script: samples.iter().copied().collect(),
            idle: false,
        }
    }
}

impl MomentaryInput for MockButton {
    fn is_active(&mut self) -> bool {
        self.script.pop_front().unwrap_or(self.idle)
    }
}

// ── Uploader ────────────────────────────────────────────────────────────────

/// Uploader that drains the body and answers from a script.
pub struct MockUploader {
    reply: Result<UploadResponse, UploadError>,
    body: Vec<u8>,
    url: String,
    headers: Vec<(String, String)>,
    content_length: u64,
    posts: usize,
}

impl MockUploader {
    /// Answer every request with `status` and `body`.
    pub fn replying(status: u16, body: &str) -> Self {
        let mut text = heapless::String::new();
        for ch in body.chars() {
            if text.push(ch).is_err() {
                break;
            }
        }
        Self::with_reply(Ok(UploadResponse { status, body: text }))
    }

    /// Fail every request with [`UploadError::Connectivity`].
    pub fn offline() -> Self {
        Self::with_reply(Err(UploadError::Connectivity))
    }

    fn with_reply(reply: Result<UploadResponse, UploadError>) -> Self {
        Self {
            reply,
            body: Vec::new(),
            url: String::new(),
            headers: Vec::new(),
            content_length: 0,
            posts: 0,
        }
    }

    /// Body bytes of the last request.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// URL of the last request.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Headers of the last request.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Declared `Content-Length` of the last request.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Requests attempted.
    pub fn posts(&self) -> usize {
        self.posts
    }
}

impl Uploader for MockUploader {
    async fn post<F: File>(
        &mut self,
        request: &UploadRequest<'_>,
        body: &mut BlockStream<F>,
    ) -> Result<UploadResponse, UploadError> {
        self.posts += 1;
        self.url = request.url.to_string();
        self.content_length = request.content_length;
        self.headers = request
            .headers
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        if self.reply.is_err() {
            return self.reply.clone();
        }
        self.body.clear();
        let mut chunk = [0u8; 512];
        loop {
            let n = body.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            self.body.extend_from_slice(&chunk[..n]);
        }
        self.reply.clone()
    }
}
