//! Media catalog: numbered songs and images on the card.
//!
//! Files follow a `{prefix}{n}{suffix}` scheme with `n` counting from 1,
//! e.g. `/songs/song1.wav`. Paths are built into fixed-capacity strings;
//! [`MediaCatalog::new`] proves up front that every path fits.

use core::fmt::Write;

use crate::config::ConfigError;

/// Capacity of a generated media path.
pub const PATH_CAPACITY: usize = 48;

/// A path built from a [`MediaList`].
pub type MediaPath = heapless::String<PATH_CAPACITY>;

/// One numbered family of files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MediaList {
    prefix: &'static str,
    suffix: &'static str,
    count: usize,
}

impl MediaList {
    /// Validated list of `count` files.
    pub fn new(prefix: &'static str, suffix: &'static str, count: usize) -> Result<Self, ConfigError> {
        let list = Self::unchecked(prefix, suffix, count);
        list.check()?;
        Ok(list)
    }

    /// List without validation; [`DeviceConfig::validate`](crate::DeviceConfig::validate)
    /// checks it later.
    pub const fn unchecked(prefix: &'static str, suffix: &'static str, count: usize) -> Self {
        Self { prefix, suffix, count }
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.count
    }

    /// `true` for a list with no files.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Path of the zero-based `index`-th file.
    ///
    /// Indices past the end produce numbers past `count`; callers index
    /// through a [`ui::ListCursor`] sized by [`len`](Self::len).
    pub fn path(&self, index: usize) -> MediaPath {
        self.format(index.saturating_add(1)).unwrap_or_default()
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::EmptyCatalog);
        }
        // The highest number is the longest path.
        self.format(self.count).map(|_| ()).ok_or(ConfigError::PathTooLong)
    }

    fn format(&self, number: usize) -> Option<MediaPath> {
        let mut path = MediaPath::new();
        write!(path, "{}{}{}", self.prefix, number, self.suffix).ok()?;
        Some(path)
    }
}

/// The playlist and the slideshow, both validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaCatalog {
    songs: MediaList,
    images: MediaList,
}

impl MediaCatalog {
    /// Validate both lists.
    pub fn new(songs: MediaList, images: MediaList) -> Result<Self, ConfigError> {
        songs.check()?;
        images.check()?;
        Ok(Self { songs, images })
    }

    /// Playlist.
    pub fn songs(&self) -> &MediaList {
        &self.songs
    }

    /// Slideshow.
    pub fn images(&self) -> &MediaList {
        &self.images
    }
}
