//! Text drawn through the render sink's built-in font.
//!
//! The font is the panel driver's classic 5×7 glyph in a 6×8 cell, scaled
//! by an integer text size.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;
use platform::RenderSink;

/// Glyph cell width at text size 1.
pub const GLYPH_WIDTH: u32 = 6;
/// Glyph cell height at text size 1.
pub const GLYPH_HEIGHT: u32 = 8;

/// Color, optional background and scale of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    /// Glyph color
    pub color: Rgb565,
    /// Cleared behind the text before printing, when set
    pub background: Option<Rgb565>,
    /// Integer scale, 1 = 6×8 cells
    pub size: u8,
}

impl TextStyle {
    /// Transparent-background text.
    pub const fn new(color: Rgb565, size: u8) -> Self {
        Self {
            color,
            background: None,
            size,
        }
    }

    /// Clear the text's cells to `background` before printing.
    #[must_use]
    pub const fn with_background(mut self, background: Rgb565) -> Self {
        self.background = Some(background);
        self
    }

    /// Area covered by `chars` glyphs on one line.
    pub fn extent(&self, chars: usize) -> Size {
        let scale = u32::from(self.size.max(1));
        let chars = u32::try_from(chars).unwrap_or(u32::MAX);
        Size::new(
            GLYPH_WIDTH.saturating_mul(scale).saturating_mul(chars),
            GLYPH_HEIGHT.saturating_mul(scale),
        )
    }
}

/// Print `text` at `at` in `style`.
pub fn draw_text<D: RenderSink>(sink: &mut D, at: Point, style: TextStyle, text: &str) -> Result<(), D::Error> {
    if let Some(background) = style.background {
        sink.fill_rect(Rectangle::new(at, style.extent(text.chars().count())), background)?;
    }
    sink.set_cursor(at);
    sink.set_text_color(style.color);
    sink.set_text_size(style.size);
    sink.print(text)
}
