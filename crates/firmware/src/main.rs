//! Media Streamer - Desktop Emulator Entry Point
//!
//! Runs the real scheduler against files under `MEDIA_ROOT` (default
//! `./media`), with a real-time paced speaker and a logging panel.
//!
//! Run with: MEDIA_ROOT=./media cargo run -p firmware --bin emulator --features emulator
//! Log level: RUST_LOG=debug (default `info`)

use embassy_time::Instant;
use firmware::emulator::{IdleButton, LogDisplay, LoopbackUploader, PacedSpeaker, SilentMicrophone};
use firmware::{boot, DeviceConfig, FirmwareError, Scheduler};
use platform::storage_local::LocalFileStorage;
use tracing_subscriber::EnvFilter;

/// Panel size of the stock 240×320 TFT.
const PANEL_WIDTH: u32 = 240;
const PANEL_HEIGHT: u32 = 320;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), FirmwareError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    boot::announce();
    let mut storage = LocalFileStorage::from_env().unwrap_or_else(|| LocalFileStorage::new("./media"));
    tracing::info!(root = %storage.root_display(), "media root");
    boot::mount_or_halt(&mut storage).await;

    let config = DeviceConfig::default();
    let speaker = PacedSpeaker::new(config.playback_format);
    let mut microphone = SilentMicrophone::new(config.capture_format);
    let display = LogDisplay::new(PANEL_WIDTH, PANEL_HEIGHT);

    let mut scheduler = Scheduler::new(storage, speaker, display, IdleButton, config, Instant::now())?;
    scheduler.start().await;

    if scheduler.config().capture_on_boot {
        match scheduler.capture(&mut microphone, &mut LoopbackUploader).await {
            Ok(transcript) => tracing::info!(status = transcript.status, text = %transcript.text, "transcript"),
            Err(e) => tracing::error!(error = %e, "capture flow failed"),
        }
    }

    match scheduler.run().await {}
}
