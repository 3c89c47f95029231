//! Boot sequence for the media streamer.
//!
//! Initialization order (each step depends on the one before it):
//!   1. Mount the card; a card that does not mount halts the device
//!   2. Validate the configuration and build the media catalog
//!   3. Draw the clock and start the first slideshow image
//!   4. Optionally record and upload one capture
//!   5. Enter the cooperative loop

use core::convert::Infallible;

use embassy_time::{Duration, Timer};
use platform::config::{boot_banner, APP_VERSION};
use platform::Storage;

/// Ordered list of boot steps for documentation and testing.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "1. Storage: mount the card or halt",
    "2. Config: validate chunk sizes, periods and media paths",
    "3. Display: draw the clock overlay and the first image",
    "4. Capture: record, finalize and upload once (optional)",
    "5. Scheduler: run the gate loop forever",
];

/// How often a halted device wakes to log that it is still halted.
pub const HALT_HEARTBEAT: Duration = Duration::from_secs(10);

/// Log the boot banner.
pub fn announce() {
    info!("{} (v{})", boot_banner(), APP_VERSION);
}

/// Mount `storage`, or halt forever if it will not mount.
pub async fn mount_or_halt<S: Storage>(storage: &mut S) {
    if let Err(e) = storage.mount().await {
        error!("storage mount failed: {}", e);
        match halt().await {}
    }
    info!("storage mounted");
}

/// Park the device. Never returns.
pub async fn halt() -> Infallible {
    loop {
        Timer::after(HALT_HEARTBEAT).await;
        warn!("halted");
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;
    use platform::mocks::MemStorage;

    #[test]
    fn test_storage_mounts_before_anything_else() {
        assert!(BOOT_SEQUENCE_STEPS[0].contains("Storage"));
        let scheduler = BOOT_SEQUENCE_STEPS.iter().position(|s| s.contains("Scheduler")).unwrap();
        assert_eq!(scheduler, BOOT_SEQUENCE_STEPS.len() - 1);
    }

    #[test]
    fn test_config_validated_before_first_draw() {
        let config = BOOT_SEQUENCE_STEPS.iter().position(|s| s.contains("Config")).unwrap();
        let display = BOOT_SEQUENCE_STEPS.iter().position(|s| s.contains("Display")).unwrap();
        assert!(config < display);
    }

    #[tokio::test]
    async fn test_mounted_card_boots() {
        let mut storage = MemStorage::new();
        tokio::time::timeout(std::time::Duration::from_millis(100), mount_or_halt(&mut storage))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unmountable_card_halts() {
        let mut storage = MemStorage::unmounted();
        let outcome = tokio::time::timeout(std::time::Duration::from_millis(100), mount_or_halt(&mut storage)).await;
        assert!(outcome.is_err(), "boot must not continue without storage");
    }
}
