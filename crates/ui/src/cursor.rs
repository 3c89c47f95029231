//! Bounded list cursor for the playlist and the slideshow.
//!
//! A cursor walks a fixed-length list and wraps at both ends. The list is
//! never empty: a zero-length cursor cannot be constructed.

/// Position in a non-empty list of `len` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ListCursor {
    index: usize,
    len: usize,
}

impl ListCursor {
    /// Cursor on the first of `len` items, or `None` for an empty list.
    pub fn new(len: usize) -> Option<Self> {
        (len > 0).then_some(Self { index: 0, len })
    }

    /// Zero-based index of the current item.
    #[must_use]
    pub fn current(&self) -> usize {
        self.index
    }

    /// Step to the next item, wrapping to the first after the last.
    pub fn forward(&mut self) {
        let next = self.index.saturating_add(1);
        self.index = if next >= self.len { 0 } else { next };
    }

    /// Step to the previous item, wrapping to the last before the first.
    pub fn backward(&mut self) {
        self.index = match self.index.checked_sub(1) {
            Some(prev) => prev,
            None => self.len.saturating_sub(1),
        };
    }

    /// Number of items in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: empty cursors are not constructible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}
