//! Application identity constants
//!
//! Branding and versioning referenced by the boot banner and the upload
//! request headers. Tunable device parameters live in `firmware::config`.

/// The application name
pub const APP_NAME: &str = "Media Streamer";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `User-Agent` value sent with uploads.
pub const USER_AGENT: &str = concat!("media-streamer/", env!("CARGO_PKG_VERSION"));

/// Boot banner
pub const fn boot_banner() -> &'static str {
    "Media Streamer - booting"
}
