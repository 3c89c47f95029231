//! Pixel format conversion for the RGB565 panel.

use embedded_graphics::pixelcolor::Rgb565;

/// Pack a 24-bit BGR pixel (BMP byte order) into 5-6-5.
///
/// Low bits are truncated, not rounded.
#[allow(clippy::arithmetic_side_effects)] // constant shifts on u8 cannot overflow
pub fn bgr_to_rgb565(blue: u8, green: u8, red: u8) -> Rgb565 {
    Rgb565::new(red >> 3, green >> 2, blue >> 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::IntoStorage;

    #[test]
    fn test_primaries() {
        assert_eq!(bgr_to_rgb565(0, 0, 255).into_storage(), 0xF800);
        assert_eq!(bgr_to_rgb565(0, 255, 0).into_storage(), 0x07E0);
        assert_eq!(bgr_to_rgb565(255, 0, 0).into_storage(), 0x001F);
    }

    #[test]
    fn test_black_and_white() {
        assert_eq!(bgr_to_rgb565(0, 0, 0).into_storage(), 0x0000);
        assert_eq!(bgr_to_rgb565(255, 255, 255).into_storage(), 0xFFFF);
    }

    #[test]
    fn test_low_bits_truncate() {
        // 0x07 red, 0x03 green, 0x07 blue all fall below one step
        assert_eq!(bgr_to_rgb565(7, 3, 7).into_storage(), 0x0000);
        assert_eq!(bgr_to_rgb565(8, 4, 8).into_storage(), 0x0821);
    }
}
