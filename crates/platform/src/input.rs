//! Input device abstraction

/// A momentary push button sampled by polling.
///
/// Debouncing is the caller's business: the scheduler applies a fixed
/// time window between accepted presses.
pub trait MomentaryInput {
    /// `true` while the button is held.
    fn is_active(&mut self) -> bool;
}
