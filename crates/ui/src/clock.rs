//! Wall clock and its on-screen overlay.
//!
//! The clock has no hardware RTC behind it: it starts from a configured
//! time of day and is advanced by the scheduler's one-second gate.

use core::fmt::Write;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::Point;
use platform::RenderSink;

use crate::text::{draw_text, TextStyle};

/// Seconds in one day; the clock wraps at midnight.
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Time of day with one-second resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WallClock {
    seconds: u32,
}

impl WallClock {
    /// `None` unless `hours < 24`, `minutes < 60` and `seconds < 60`.
    pub fn new(hours: u8, minutes: u8, seconds: u8) -> Option<Self> {
        if hours >= 24 || minutes >= 60 || seconds >= 60 {
            return None;
        }
        let total = u32::from(hours)
            .saturating_mul(3600)
            .saturating_add(u32::from(minutes).saturating_mul(60))
            .saturating_add(u32::from(seconds));
        Some(Self { seconds: total })
    }

    /// 00:00:00.
    pub const fn midnight() -> Self {
        Self { seconds: 0 }
    }

    /// Advance by one second.
    pub fn tick(&mut self) {
        self.advance(1);
    }

    /// Advance by `seconds`, wrapping at midnight.
    pub fn advance(&mut self, seconds: u32) {
        let step = seconds.checked_rem(SECONDS_PER_DAY).unwrap_or(0);
        let total = self.seconds.saturating_add(step);
        self.seconds = total.checked_rem(SECONDS_PER_DAY).unwrap_or(0);
    }

    /// Hours, 0..=23.
    pub fn hours(&self) -> u32 {
        self.seconds.checked_div(3600).unwrap_or(0)
    }

    /// Minutes, 0..=59.
    pub fn minutes(&self) -> u32 {
        self.seconds.checked_rem(3600).and_then(|s| s.checked_div(60)).unwrap_or(0)
    }

    /// Seconds, 0..=59.
    pub fn seconds(&self) -> u32 {
        self.seconds.checked_rem(60).unwrap_or(0)
    }

    /// `HH:MM:SS`.
    pub fn text(&self) -> heapless::String<8> {
        let mut text = heapless::String::new();
        // Eight characters always fit.
        let _ = write!(text, "{:02}:{:02}:{:02}", self.hours(), self.minutes(), self.seconds());
        text
    }
}

/// Where and how the clock is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockOverlay {
    /// Top-left corner of the text
    pub origin: Point,
    /// Text style; the background is cleared on every redraw
    pub style: TextStyle,
}

impl ClockOverlay {
    /// White size-2 text on black at `origin`.
    pub fn new(origin: Point) -> Self {
        Self {
            origin,
            style: TextStyle::new(Rgb565::new(31, 63, 31), 2).with_background(Rgb565::new(0, 0, 0)),
        }
    }

    /// Clear the previous reading and print `clock`.
    pub fn draw<D: RenderSink>(&self, sink: &mut D, clock: &WallClock) -> Result<(), D::Error> {
        draw_text(sink, self.origin, self.style, &clock.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::mocks::MockRenderSink;

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(WallClock::new(24, 0, 0).is_none());
        assert!(WallClock::new(0, 60, 0).is_none());
        assert!(WallClock::new(0, 0, 60).is_none());
        assert!(WallClock::new(23, 59, 59).is_some());
    }

    #[test]
    fn test_text_is_zero_padded() {
        let clock = WallClock::new(7, 5, 9).unwrap_or_default();
        assert_eq!(clock.text().as_str(), "07:05:09");
    }

    #[test]
    fn test_tick_carries_into_minutes_and_hours() {
        let mut clock = WallClock::new(9, 59, 59).unwrap_or_default();
        clock.tick();
        assert_eq!(clock.text().as_str(), "10:00:00");
    }

    #[test]
    fn test_wraps_at_midnight() {
        let mut clock = WallClock::new(23, 59, 59).unwrap_or_default();
        clock.tick();
        assert_eq!(clock, WallClock::midnight());
        clock.advance(SECONDS_PER_DAY * 2 + 61);
        assert_eq!(clock.text().as_str(), "00:01:01");
    }

    #[test]
    fn test_overlay_clears_then_prints() {
        let mut sink = MockRenderSink::new(240, 320);
        let overlay = ClockOverlay::new(Point::new(0, 0));
        let clock = WallClock::new(12, 30, 0).unwrap_or_default();
        let _ = overlay.draw(&mut sink, &clock);
        assert_eq!(sink.fills().len(), 1);
        assert_eq!(sink.printed().last().map(|(_, t)| t.as_str()), Some("12:30:00"));
        assert_eq!(sink.text_size(), 2);
    }
}
