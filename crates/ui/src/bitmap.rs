//! Streaming decoder for uncompressed 24-bit BMP files.
//!
//! The image is never held in memory. Each destination row is located with
//! at most one seek and streamed through a 60-byte cache (20 pixels) that is
//! refilled from storage as the row is drawn. Rows can be rendered in slices
//! ([`BitmapRowDecoder::render_rows`]) so a cooperative scheduler can spread
//! one image over several ticks.
//!
//! ```text
//! file header (14)   "BM" | size u32 | reserved u16 ×2 | pixel offset u32
//! info header (40+)  size u32 | width i32 | height i32 | planes u16
//!                    | bpp u16 | compression u32 | ...
//! pixel data         rows of BGR triplets padded to 4 bytes;
//!                    height > 0 stores rows bottom-up
//! ```

use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;
use platform::{BlockStream, File, OpenMode, RenderSink, Storage, StorageError};
use thiserror_no_std::Error;

use crate::color::bgr_to_rgb565;

const MAGIC: &[u8; 2] = b"BM";
/// Header bytes after the magic: rest of the file header plus the 40-byte
/// info header.
const HEADER_REST: usize = 52;
const BYTES_PER_PIXEL: u64 = 3;

/// Row cache size in bytes.
pub const ROW_CACHE_BYTES: usize = 60;

/// Bitmap decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitmapError {
    /// The backing stream failed (including a missing file).
    #[error("storage: {0}")]
    Storage(StorageError),
    /// The file does not start with `BM`.
    #[error("not a BMP file")]
    BadMagic,
    /// Header ends before the info header is complete.
    #[error("truncated BMP header")]
    Truncated,
    /// Only 24 bits per pixel are decoded.
    #[error("unsupported depth: {0} bpp")]
    UnsupportedDepth(u16),
    /// Only uncompressed images are decoded.
    #[error("unsupported compression: {0}")]
    Compressed(u32),
    /// Width is not positive or height is zero.
    #[error("invalid bitmap dimensions")]
    InvalidDimensions,
    /// The render sink refused a call.
    #[error("display error")]
    Display,
}

impl From<StorageError> for BitmapError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

/// Bytes one stored row occupies: `3 * width` rounded up to a multiple of 4.
pub fn row_stride(width: u32) -> u64 {
    u64::from(width).saturating_mul(BYTES_PER_PIXEL).saturating_add(3) & !3
}

/// Parsed and validated header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitmapHeader {
    /// Offset of the first pixel row
    pub offset: u32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels; positive means bottom-up storage
    pub height: i32,
    /// Bits per pixel (always 24 once validated)
    pub bits_per_pixel: u16,
}

impl BitmapHeader {
    /// Parse everything after the 2-byte magic.
    fn parse(rest: &[u8]) -> Result<Self, BitmapError> {
        // Offsets below are relative to byte 2 of the file.
        let offset = le_u32(rest, 8).ok_or(BitmapError::Truncated)?;
        let width = le_u32(rest, 16).ok_or(BitmapError::Truncated)?;
        let height = le_u32(rest, 20).ok_or(BitmapError::Truncated)?;
        let bits_per_pixel = le_u16(rest, 26).ok_or(BitmapError::Truncated)?;
        let compression = le_u32(rest, 28).ok_or(BitmapError::Truncated)?;

        if bits_per_pixel != 24 {
            return Err(BitmapError::UnsupportedDepth(bits_per_pixel));
        }
        if compression != 0 {
            return Err(BitmapError::Compressed(compression));
        }
        let header = Self {
            offset,
            width: i32::from_le_bytes(width.to_le_bytes()),
            height: i32::from_le_bytes(height.to_le_bytes()),
            bits_per_pixel,
        };
        if header.width <= 0 || header.height == 0 || header.height == i32::MIN {
            return Err(BitmapError::InvalidDimensions);
        }
        Ok(header)
    }

    /// Width in pixels.
    pub fn columns(&self) -> u32 {
        self.width.unsigned_abs()
    }

    /// Number of rows.
    pub fn rows(&self) -> u32 {
        self.height.unsigned_abs()
    }

    /// `true` when rows are stored bottom-up.
    pub fn flipped(&self) -> bool {
        self.height > 0
    }

    /// Stored row length including padding.
    pub fn stride(&self) -> u64 {
        row_stride(self.columns())
    }

    /// Storage row holding destination row `row`.
    pub fn source_row(&self, row: u32) -> u32 {
        if self.flipped() {
            self.rows().saturating_sub(1).saturating_sub(row)
        } else {
            row
        }
    }

    /// Byte offset of storage row `source_row`.
    pub fn row_offset(&self, source_row: u32) -> u64 {
        u64::from(self.offset).saturating_add(u64::from(source_row).saturating_mul(self.stride()))
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

/// Outcome of a completed decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitmapSummary {
    /// Rows drawn (after clipping to the panel)
    pub rows_drawn: u32,
    /// Rows that ended early because storage ran out of data
    pub short_rows: u32,
}

/// Row-at-a-time BMP renderer over an open read stream.
pub struct BitmapRowDecoder<F: File> {
    stream: BlockStream<F>,
    header: BitmapHeader,
    origin: Point,
    visible: Size,
    next_row: u32,
    short_rows: u32,
    window_set: bool,
}

impl<F: File> BitmapRowDecoder<F> {
    /// Open `path`, validate its header and prepare to draw it at `origin`.
    ///
    /// The magic is checked before any other header byte is read. On every
    /// error the stream is closed before returning.
    pub async fn open<S, D>(storage: &mut S, path: &str, sink: &D, origin: Point) -> Result<Self, BitmapError>
    where
        S: Storage<File = F>,
        D: RenderSink,
    {
        let mut stream = BlockStream::open(storage, path, OpenMode::Read).await?;
        match read_header(&mut stream).await {
            Ok(header) => {
                let visible = visible_area(&header, origin, sink.size());
                debug!(
                    "bitmap {}: {}x{}, flipped {}",
                    path,
                    header.columns(),
                    header.rows(),
                    header.flipped()
                );
                Ok(Self {
                    stream,
                    header,
                    origin,
                    visible,
                    next_row: 0,
                    short_rows: 0,
                    window_set: false,
                })
            }
            Err(e) => {
                if let Err(close) = stream.close().await {
                    warn!("bitmap close failed: {}", close);
                }
                Err(e)
            }
        }
    }

    /// Validated header.
    pub fn header(&self) -> BitmapHeader {
        self.header
    }

    /// Rows still to be drawn.
    pub fn rows_remaining(&self) -> u32 {
        self.visible.height.saturating_sub(self.next_row)
    }

    /// `true` once every visible row has been drawn.
    pub fn is_complete(&self) -> bool {
        self.rows_remaining() == 0
    }

    /// Draw up to `max_rows` more rows and return how many were drawn.
    ///
    /// The stream is closed when the last row is drawn or on any error.
    pub async fn render_rows<D: RenderSink>(&mut self, sink: &mut D, max_rows: u32) -> Result<u32, BitmapError> {
        match self.render_slice(sink, max_rows).await {
            Ok(drawn) => {
                if self.is_complete() {
                    self.stream.close().await?;
                }
                Ok(drawn)
            }
            Err(e) => {
                if let Err(close) = self.stream.close().await {
                    warn!("bitmap close failed: {}", close);
                }
                Err(e)
            }
        }
    }

    /// Draw every remaining row and release the stream.
    pub async fn render_all<D: RenderSink>(mut self, sink: &mut D) -> Result<BitmapSummary, BitmapError> {
        self.render_rows(sink, u32::MAX).await?;
        // An image entirely off-panel draws nothing and still needs closing.
        self.stream.close().await?;
        Ok(self.summary())
    }

    /// Rows drawn so far and rows cut short.
    pub fn summary(&self) -> BitmapSummary {
        BitmapSummary {
            rows_drawn: self.next_row,
            short_rows: self.short_rows,
        }
    }

    /// Release the stream between slices; the row position is kept.
    ///
    /// [`resume`](Self::resume) reopens the file before the next slice.
    pub async fn suspend(&mut self) -> Result<(), BitmapError> {
        self.stream.close().await.map_err(BitmapError::from)
    }

    /// `true` while the stream is released.
    pub fn is_suspended(&self) -> bool {
        self.stream.is_closed()
    }

    /// Reopen `path` after [`suspend`](Self::suspend).
    ///
    /// The fresh stream sits at offset 0, so the next row seeks to its own
    /// offset. A no-op while the stream is still open.
    pub async fn resume<S>(&mut self, storage: &mut S, path: &str) -> Result<(), BitmapError>
    where
        S: Storage<File = F>,
    {
        if self.stream.is_closed() && !self.is_complete() {
            self.stream = BlockStream::open(storage, path, OpenMode::Read).await?;
        }
        Ok(())
    }

    /// Release the stream without drawing the rest.
    pub async fn close(mut self) -> Result<(), BitmapError> {
        self.stream.close().await.map_err(BitmapError::from)
    }

    async fn render_slice<D: RenderSink>(&mut self, sink: &mut D, max_rows: u32) -> Result<u32, BitmapError> {
        if self.is_complete() {
            return Ok(0);
        }
        if !self.window_set {
            sink.set_addr_window(Rectangle::new(self.origin, self.visible))
                .map_err(|_| BitmapError::Display)?;
            self.window_set = true;
        }
        let mut drawn = 0u32;
        while drawn < max_rows && !self.is_complete() {
            self.render_row(sink, self.next_row).await?;
            self.next_row = self.next_row.saturating_add(1);
            drawn = drawn.saturating_add(1);
        }
        Ok(drawn)
    }

    async fn render_row<D: RenderSink>(&mut self, sink: &mut D, row: u32) -> Result<(), BitmapError> {
        let source = self.header.source_row(row);
        self.stream.seek(self.header.row_offset(source)).await?;

        let y = offset(self.origin.y, row);
        let width = self.visible.width;
        let mut cache = [0u8; ROW_CACHE_BYTES];
        let mut x = 0u32;
        while x < width {
            let pixels_left = usize::try_from(width.saturating_sub(x)).unwrap_or(usize::MAX);
            let want = pixels_left.saturating_mul(3).min(ROW_CACHE_BYTES);
            let slot = cache.get_mut(..want).unwrap_or_default();
            let got = self.stream.read_full(slot).await?;
            let pixels = slot.get(..got).unwrap_or_default().chunks_exact(3);
            for pixel in pixels {
                if let &[blue, green, red] = pixel {
                    sink.draw_pixel(Point::new(offset(self.origin.x, x), y), bgr_to_rgb565(blue, green, red))
                        .map_err(|_| BitmapError::Display)?;
                    x = x.saturating_add(1);
                }
            }
            if got < want {
                self.short_rows = self.short_rows.saturating_add(1);
                debug!("bitmap row {} short: {} of {} pixels", row, x, width);
                break;
            }
        }
        Ok(())
    }
}

async fn read_header<F: File>(stream: &mut BlockStream<F>) -> Result<BitmapHeader, BitmapError> {
    let mut magic = [0u8; 2];
    let n = stream.read_full(&mut magic).await?;
    if n != magic.len() || &magic != MAGIC {
        return Err(BitmapError::BadMagic);
    }
    let mut rest = [0u8; HEADER_REST];
    let n = stream.read_full(&mut rest).await?;
    BitmapHeader::parse(rest.get(..n).unwrap_or_default())
}

/// Part of the image that lands on the panel when drawn at `origin`.
fn visible_area(header: &BitmapHeader, origin: Point, panel: Size) -> Size {
    let (Ok(x), Ok(y)) = (u32::try_from(origin.x), u32::try_from(origin.y)) else {
        return Size::zero();
    };
    let width = header.columns().min(panel.width.saturating_sub(x));
    let height = header.rows().min(panel.height.saturating_sub(y));
    if width == 0 || height == 0 {
        return Size::zero();
    }
    Size::new(width, height)
}

fn offset(base: i32, by: u32) -> i32 {
    base.saturating_add(i32::try_from(by).unwrap_or(i32::MAX))
}

/// Decode `path` onto `sink` at `origin` in one blocking pass.
pub async fn draw_bitmap<S, D>(storage: &mut S, path: &str, sink: &mut D, origin: Point) -> Result<BitmapSummary, BitmapError>
where
    S: Storage,
    D: RenderSink,
{
    let decoder = BitmapRowDecoder::open(storage, path, sink, origin).await?;
    decoder.render_all(sink).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::Rgb565;
    use platform::mocks::{MemStorage, MockRenderSink};

    /// Build a 24-bit BMP whose storage row `i` is filled with `rows[i]`.
    fn bmp(width: u32, height: i32, rows: &[[u8; 3]]) -> Vec<u8> {
        let stride = row_stride(width) as usize;
        let offset = 54u32;
        let mut out = Vec::new();
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&(offset + (stride * rows.len()) as u32).to_le_bytes());
        out.extend_from_slice(&[0, 0, 0, 0]);
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&(width as i32).to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&24u16.to_le_bytes());
        out.extend_from_slice(&[0u8; 24]);
        for bgr in rows {
            let mut row = Vec::new();
            for _ in 0..width {
                row.extend_from_slice(bgr);
            }
            row.resize(stride, 0xEE);
            out.extend_from_slice(&row);
        }
        out
    }

    fn color(bgr: [u8; 3]) -> Rgb565 {
        bgr_to_rgb565(bgr[0], bgr[1], bgr[2])
    }

    const RED: [u8; 3] = [0, 0, 255];
    const GREEN: [u8; 3] = [0, 255, 0];
    const BLUE: [u8; 3] = [255, 0, 0];
    const WHITE: [u8; 3] = [255, 255, 255];

    #[test]
    fn stride_is_four_byte_aligned() {
        assert_eq!(row_stride(5), 16);
        assert_eq!(row_stride(4), 12);
        assert_eq!(row_stride(1), 4);
        assert_eq!(row_stride(0), 0);
    }

    #[test]
    fn stride_of_very_wide_rows_does_not_wrap() {
        assert_eq!(row_stride(u32::MAX), 12_884_901_888);
        let header = BitmapHeader {
            offset: 54,
            width: 2_000_000_000,
            height: -2,
            bits_per_pixel: 24,
        };
        assert_eq!(header.stride(), 6_000_000_000);
        assert_eq!(header.row_offset(1), 54 + 6_000_000_000);
    }

    #[test]
    fn source_row_follows_height_sign() {
        let mut header = BitmapHeader {
            offset: 54,
            width: 4,
            height: 3,
            bits_per_pixel: 24,
        };
        assert_eq!(header.source_row(0), 2);
        assert_eq!(header.source_row(2), 0);
        header.height = -3;
        assert_eq!(header.source_row(0), 0);
        assert_eq!(header.row_offset(2), 54 + 2 * 12);
    }

    #[tokio::test]
    async fn bottom_up_rows_render_in_reverse_storage_order() {
        let mut storage = MemStorage::new();
        storage.insert("/images/image1.bmp", &bmp(4, 4, &[RED, GREEN, BLUE, WHITE]));
        let mut sink = MockRenderSink::new(240, 320);
        let summary = draw_bitmap(&mut storage, "/images/image1.bmp", &mut sink, Point::zero())
            .await
            .unwrap();
        assert_eq!(summary.rows_drawn, 4);
        assert_eq!(summary.short_rows, 0);
        for x in 0..4 {
            assert_eq!(sink.pixel(x, 0), Some(color(WHITE)));
            assert_eq!(sink.pixel(x, 1), Some(color(BLUE)));
            assert_eq!(sink.pixel(x, 2), Some(color(GREEN)));
            assert_eq!(sink.pixel(x, 3), Some(color(RED)));
        }
        assert_eq!(sink.windows(), &[Rectangle::new(Point::zero(), Size::new(4, 4))]);
        assert_eq!(storage.open_count(), 0);
    }

    #[tokio::test]
    async fn top_down_rows_render_in_storage_order() {
        let mut storage = MemStorage::new();
        storage.insert("/t.bmp", &bmp(5, -3, &[RED, GREEN, BLUE]));
        let mut sink = MockRenderSink::new(240, 320);
        draw_bitmap(&mut storage, "/t.bmp", &mut sink, Point::new(10, 20)).await.unwrap();
        assert_eq!(sink.pixel(10, 20), Some(color(RED)));
        assert_eq!(sink.pixel(14, 21), Some(color(GREEN)));
        assert_eq!(sink.pixel(12, 22), Some(color(BLUE)));
        assert_eq!(sink.draw_log().len(), 15);
    }

    #[tokio::test]
    async fn unpadded_top_down_rows_never_seek() {
        let mut storage = MemStorage::new();
        storage.insert("/t.bmp", &bmp(4, -4, &[RED, GREEN, BLUE, WHITE]));
        let mut sink = MockRenderSink::new(240, 320);
        draw_bitmap(&mut storage, "/t.bmp", &mut sink, Point::zero()).await.unwrap();
        // Header ends at the pixel offset, and rows are contiguous.
        assert_eq!(storage.seek_count(), 0);
    }

    #[tokio::test]
    async fn wide_rows_refill_the_cache() {
        let mut storage = MemStorage::new().with_read_limit(7);
        storage.insert("/w.bmp", &bmp(45, 2, &[GREEN, RED]));
        let mut sink = MockRenderSink::new(240, 320);
        draw_bitmap(&mut storage, "/w.bmp", &mut sink, Point::zero()).await.unwrap();
        assert_eq!(sink.draw_log().len(), 90);
        assert_eq!(sink.pixel(44, 0), Some(color(RED)));
        assert_eq!(sink.pixel(44, 1), Some(color(GREEN)));
    }

    #[tokio::test]
    async fn bad_magic_is_rejected_and_stream_closed() {
        let mut storage = MemStorage::new();
        let mut bytes = bmp(4, 4, &[RED, GREEN, BLUE, WHITE]);
        bytes[0] = b'X';
        storage.insert("/bad.bmp", &bytes);
        let mut sink = MockRenderSink::new(240, 320);
        let result = draw_bitmap(&mut storage, "/bad.bmp", &mut sink, Point::zero()).await;
        assert_eq!(result, Err(BitmapError::BadMagic));
        assert_eq!(storage.open_count(), 0);
        assert!(sink.draw_log().is_empty());
        assert!(sink.windows().is_empty());
    }

    #[tokio::test]
    async fn unsupported_depth_and_compression_are_rejected() {
        let mut storage = MemStorage::new();
        let mut sink = MockRenderSink::new(240, 320);

        let mut depth = bmp(2, 2, &[RED, RED]);
        depth[28..30].copy_from_slice(&32u16.to_le_bytes());
        storage.insert("/d.bmp", &depth);
        let result = draw_bitmap(&mut storage, "/d.bmp", &mut sink, Point::zero()).await;
        assert_eq!(result, Err(BitmapError::UnsupportedDepth(32)));

        let mut rle = bmp(2, 2, &[RED, RED]);
        rle[30..34].copy_from_slice(&1u32.to_le_bytes());
        storage.insert("/c.bmp", &rle);
        let result = draw_bitmap(&mut storage, "/c.bmp", &mut sink, Point::zero()).await;
        assert_eq!(result, Err(BitmapError::Compressed(1)));
        assert_eq!(storage.open_count(), 0);
    }

    #[tokio::test]
    async fn missing_file_reports_not_found() {
        let mut storage = MemStorage::new();
        let mut sink = MockRenderSink::new(240, 320);
        let result = draw_bitmap(&mut storage, "/images/image9.bmp", &mut sink, Point::zero()).await;
        assert_eq!(result, Err(BitmapError::Storage(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn truncated_pixel_data_renders_what_exists() {
        let mut storage = MemStorage::new();
        let mut bytes = bmp(4, -2, &[RED, GREEN]);
        bytes.truncate(54 + 12 + 6);
        storage.insert("/short.bmp", &bytes);
        let mut sink = MockRenderSink::new(240, 320);
        let summary = draw_bitmap(&mut storage, "/short.bmp", &mut sink, Point::zero()).await.unwrap();
        assert_eq!(summary.short_rows, 1);
        assert_eq!(sink.draw_log().len(), 6);
        assert_eq!(sink.pixel(1, 1), Some(color(GREEN)));
        assert_eq!(sink.pixel(2, 1), None);
    }

    #[tokio::test]
    async fn rows_can_be_rendered_in_slices() {
        let mut storage = MemStorage::new();
        storage.insert("/s.bmp", &bmp(3, 5, &[RED, GREEN, BLUE, WHITE, RED]));
        let mut sink = MockRenderSink::new(240, 320);
        let mut decoder = BitmapRowDecoder::open(&mut storage, "/s.bmp", &sink, Point::zero()).await.unwrap();
        assert_eq!(decoder.render_rows(&mut sink, 2).await.unwrap(), 2);
        assert_eq!(decoder.rows_remaining(), 3);
        assert_eq!(storage.open_count(), 1);
        assert_eq!(decoder.render_rows(&mut sink, 2).await.unwrap(), 2);
        assert_eq!(decoder.render_rows(&mut sink, 2).await.unwrap(), 1);
        assert!(decoder.is_complete());
        assert_eq!(storage.open_count(), 0);
        assert_eq!(sink.windows().len(), 1);
        assert_eq!(sink.pixel(0, 4), Some(color(RED)));
        assert_eq!(sink.pixel(0, 0), Some(color(RED)));
        assert_eq!(sink.pixel(0, 1), Some(color(WHITE)));
    }

    #[tokio::test]
    async fn suspended_decoder_reopens_at_the_next_row() {
        let mut storage = MemStorage::new();
        storage.insert("/s.bmp", &bmp(3, 5, &[RED, GREEN, BLUE, WHITE, RED]));
        let mut sink = MockRenderSink::new(240, 320);
        let mut decoder = BitmapRowDecoder::open(&mut storage, "/s.bmp", &sink, Point::zero()).await.unwrap();
        decoder.suspend().await.unwrap();
        assert!(decoder.is_suspended());
        assert_eq!(storage.open_count(), 0);

        while !decoder.is_complete() {
            decoder.resume(&mut storage, "/s.bmp").await.unwrap();
            assert_eq!(storage.open_count(), 1);
            decoder.render_rows(&mut sink, 2).await.unwrap();
            decoder.suspend().await.unwrap();
            assert_eq!(storage.open_count(), 0);
        }
        assert_eq!(sink.windows().len(), 1);
        assert_eq!(sink.draw_log().len(), 15);
        assert_eq!(sink.pixel(2, 1), Some(color(WHITE)));
        assert_eq!(sink.pixel(2, 2), Some(color(BLUE)));
        assert_eq!(sink.pixel(2, 3), Some(color(GREEN)));

        // A finished decoder is not reopened.
        decoder.resume(&mut storage, "/s.bmp").await.unwrap();
        assert_eq!(storage.open_count(), 0);
    }

    #[tokio::test]
    async fn image_is_clipped_to_panel() {
        let mut storage = MemStorage::new();
        storage.insert("/big.bmp", &bmp(8, 8, &[RED; 8]));
        let mut sink = MockRenderSink::new(10, 10);
        let summary = draw_bitmap(&mut storage, "/big.bmp", &mut sink, Point::new(6, 7)).await.unwrap();
        assert_eq!(summary.rows_drawn, 3);
        assert_eq!(sink.draw_log().len(), 12);
        assert_eq!(sink.windows(), &[Rectangle::new(Point::new(6, 7), Size::new(4, 3))]);
        assert_eq!(storage.open_count(), 0);
    }

    #[tokio::test]
    async fn off_panel_origin_draws_nothing() {
        let mut storage = MemStorage::new();
        storage.insert("/o.bmp", &bmp(2, 2, &[RED, RED]));
        let mut sink = MockRenderSink::new(10, 10);
        let summary = draw_bitmap(&mut storage, "/o.bmp", &mut sink, Point::new(20, 0)).await.unwrap();
        assert_eq!(summary.rows_drawn, 0);
        assert!(sink.draw_log().is_empty());
        assert_eq!(storage.open_count(), 0);
    }

    proptest::proptest! {
        #[test]
        fn stride_is_smallest_multiple_of_four(width in 0u32..100_000) {
            let stride = row_stride(width);
            assert_eq!(stride % 4, 0);
            assert!(stride >= 3 * u64::from(width));
            assert!(stride < 3 * u64::from(width) + 4);
        }
    }
}
