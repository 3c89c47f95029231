//! Render sink abstraction
//!
//! The TFT driver and its font renderer live outside the streaming engine.
//! Decoded pixels and overlay text reach the panel only through this trait.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;

/// Pixel/text output surface (RGB565 TFT panel).
pub trait RenderSink {
    /// Error type for display operations
    type Error: core::fmt::Debug;

    /// Panel dimensions in pixels.
    fn size(&self) -> Size;

    /// Restrict subsequent pixel writes to `area` (controller RAM window).
    fn set_addr_window(&mut self, area: Rectangle) -> Result<(), Self::Error>;

    /// Write one pixel.
    fn draw_pixel(&mut self, at: Point, color: Rgb565) -> Result<(), Self::Error>;

    /// Fill `area` with a solid color.
    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error>;

    /// Move the text cursor.
    fn set_cursor(&mut self, at: Point);

    /// Foreground color for subsequent text.
    fn set_text_color(&mut self, color: Rgb565);

    /// Integer glyph scale for subsequent text.
    fn set_text_size(&mut self, scale: u8);

    /// Render `text` at the cursor and advance it.
    fn print(&mut self, text: &str) -> Result<(), Self::Error>;
}
