//! Device context: everything the scheduler loop carries between iterations.
//!
//! Exactly one owner (the scheduler) mutates it. Gate timestamps are
//! monotonic [`Instant`]s; a gate fires once its period has elapsed since
//! it last fired.

use embassy_time::{Duration, Instant};
use ui::{ListCursor, WallClock};

use crate::catalog::MediaCatalog;

/// Playlist and slideshow positions, the wall clock and gate timestamps.
#[derive(Debug, Clone)]
pub struct DeviceContext {
    /// Current song
    pub playlist: ListCursor,
    /// Current image
    pub slideshow: ListCursor,
    /// Time of day shown by the overlay
    pub clock: WallClock,
    last_clock: Instant,
    last_slide: Instant,
    last_press: Option<Instant>,
}

impl DeviceContext {
    /// Fresh context at `now`, both cursors on their first entry.
    ///
    /// Returns `None` when the catalog has an empty list, which a validated
    /// catalog never does.
    pub fn new(catalog: &MediaCatalog, clock: WallClock, now: Instant) -> Option<Self> {
        Some(Self {
            playlist: ListCursor::new(catalog.songs().len())?,
            slideshow: ListCursor::new(catalog.images().len())?,
            clock,
            last_clock: now,
            last_slide: now,
            last_press: None,
        })
    }

    /// Whole clock periods elapsed since the gate last fired.
    ///
    /// The gate timestamp moves forward by exactly that many periods so a
    /// late iteration does not lose the fractional remainder.
    pub fn clock_periods_due(&mut self, now: Instant, period: Duration) -> u32 {
        let elapsed = now.saturating_duration_since(self.last_clock).as_ticks();
        let step = period.as_ticks();
        let periods = elapsed.checked_div(step).unwrap_or(0);
        if periods == 0 {
            return 0;
        }
        let advance = Duration::from_ticks(periods.saturating_mul(step));
        self.last_clock = self.last_clock.checked_add(advance).unwrap_or(now);
        u32::try_from(periods).unwrap_or(u32::MAX)
    }

    /// `true` (and the gate re-armed at `now`) once `period` has elapsed
    /// since the last slide change.
    pub fn slide_due(&mut self, now: Instant, period: Duration) -> bool {
        if now.saturating_duration_since(self.last_slide) < period {
            return false;
        }
        self.last_slide = now;
        true
    }

    /// Accept a press at `now` unless one was accepted within `debounce`.
    pub fn accept_press(&mut self, now: Instant, debounce: Duration) -> bool {
        let settled = match self.last_press {
            Some(last) => now.saturating_duration_since(last) > debounce,
            None => true,
        };
        if settled {
            self.last_press = Some(now);
        }
        settled
    }
}
