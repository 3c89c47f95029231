//! Stream task state machine.
//!
//! `StreamTask` is a pure, `no_std`, allocation-free state machine that
//! tracks whether a pump is idle, streaming (and how far it has got), or
//! finished with its current file.
//!
//! It has **no** I/O. The pumps own the open stream and the channel; they
//! consult `task.state()` before each tick and report progress back through
//! [`StreamTask::advance`]. That split keeps the transitions testable on the
//! host without storage or audio mocks.

use crate::PumpError;

/// Where a pump stands with its current file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamState {
    /// No file is open.
    Idle,
    /// A file is open; `position` bytes of it have been consumed.
    Streaming {
        /// Bytes consumed so far
        position: u64,
    },
    /// The file reached end-of-stream and has been closed.
    Done,
}

/// Pure state machine behind both pump directions.
pub struct StreamTask {
    state: StreamState,
}

impl StreamTask {
    /// Create a task in the `Idle` state.
    pub const fn new() -> Self {
        Self {
            state: StreamState::Idle,
        }
    }

    /// Begin a new file at offset 0.
    ///
    /// Valid from every state: restarting a path re-streams it from the
    /// beginning.
    pub fn begin(&mut self) {
        self.state = StreamState::Streaming { position: 0 };
    }

    /// Record `bytes` more consumed and return the new position.
    ///
    /// # Errors
    ///
    /// Returns `Err(PumpError::NotStreaming)` unless streaming.
    pub fn advance(&mut self, bytes: u64) -> Result<u64, PumpError> {
        match self.state {
            StreamState::Streaming { position } => {
                let position = position.saturating_add(bytes);
                self.state = StreamState::Streaming { position };
                Ok(position)
            }
            StreamState::Idle | StreamState::Done => Err(PumpError::NotStreaming),
        }
    }

    /// Mark end-of-stream.
    ///
    /// Transitions:
    /// - `Streaming → Done`  ✓
    /// - `Idle      → Idle`  returns `Err(NotStreaming)`
    /// - `Done      → Done`  returns `Err(NotStreaming)`
    ///
    /// # Errors
    ///
    /// Returns `Err(PumpError::NotStreaming)` unless streaming.
    pub fn finish(&mut self) -> Result<u64, PumpError> {
        match self.state {
            StreamState::Streaming { position } => {
                self.state = StreamState::Done;
                Ok(position)
            }
            StreamState::Idle | StreamState::Done => Err(PumpError::NotStreaming),
        }
    }

    /// Drop back to `Idle` (abort or stop). Always succeeds.
    pub fn reset(&mut self) {
        self.state = StreamState::Idle;
    }

    /// Return the current [`StreamState`].
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Bytes consumed of the current file, if one is streaming.
    pub fn position(&self) -> Option<u64> {
        match self.state {
            StreamState::Streaming { position } => Some(position),
            StreamState::Idle | StreamState::Done => None,
        }
    }

    /// `true` while a file is open.
    pub fn is_streaming(&self) -> bool {
        matches!(self.state, StreamState::Streaming { .. })
    }
}

impl Default for StreamTask {
    fn default() -> Self {
        Self::new()
    }
}
