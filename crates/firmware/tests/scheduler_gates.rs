//! Scheduler gate order, playlist stepping and button debounce.
// Integration test file: expect/unwrap/panic are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]
//!
//! Run with: cargo test -p firmware --test scheduler_gates

use embassy_time::{Duration, Instant};
use firmware::{AudioScheduling, AudioStep, DeviceConfig, InputStep, Scheduler};
use platform::mocks::{pcm_config, MemStorage, MockButton, MockRenderSink, MockTransmitter};
use platform::ChannelWait;
use playback::StreamState;

type TestScheduler = Scheduler<MemStorage, MockTransmitter, MockRenderSink, MockButton>;

fn song(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_add(seed)).collect()
}

/// 2×2 24-bit bottom-up bitmap, one color.
fn bmp(bgr: [u8; 3]) -> Vec<u8> {
    tall_bmp(bgr, 2)
}

/// 2-pixel-wide 24-bit bottom-up bitmap of `rows` rows, one color.
fn tall_bmp(bgr: [u8; 3], rows: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(54u32 + 8 * rows).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&54u32.to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&2i32.to_le_bytes());
    out.extend_from_slice(&(rows as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&24u16.to_le_bytes());
    out.extend_from_slice(&[0; 24]);
    for _ in 0..rows {
        out.extend_from_slice(&bgr);
        out.extend_from_slice(&bgr);
        out.extend_from_slice(&[0, 0]);
    }
    out
}

fn media() -> MemStorage {
    let storage = MemStorage::new();
    storage.insert("/songs/song1.wav", &song(3000, 0));
    storage.insert("/songs/song2.wav", &song(2048, 50));
    storage.insert("/songs/song3.wav", &song(1000, 100));
    storage.insert("/images/image1.bmp", &bmp([0, 0, 255]));
    storage.insert("/images/image2.bmp", &bmp([0, 255, 0]));
    storage.insert("/images/image3.bmp", &bmp([255, 0, 0]));
    storage
}

fn config(mode: AudioScheduling) -> DeviceConfig {
    DeviceConfig {
        audio_scheduling: mode,
        playback_chunk: 1024,
        bitmap_rows_per_tick: 1,
        channel_wait: ChannelWait::Bounded(Duration::from_millis(50)),
        ..DeviceConfig::default()
    }
}

fn scheduler(storage: MemStorage, button: MockButton, config: DeviceConfig) -> TestScheduler {
    let speaker = MockTransmitter::new(pcm_config(44_100, 16, 2));
    let display = MockRenderSink::new(240, 320);
    Scheduler::new(storage, speaker, display, button, config, Instant::from_millis(0)).unwrap()
}

fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

#[tokio::test]
async fn clock_redraws_once_per_second() {
    let mut s = scheduler(media(), MockButton::released(), config(AudioScheduling::Chunked));
    assert!(!s.run_iteration(at(500)).await.clock_redrawn);
    assert!(s.run_iteration(at(1000)).await.clock_redrawn);
    assert!(!s.run_iteration(at(1400)).await.clock_redrawn);
    assert_eq!(s.display().printed().last().unwrap().1, "00:00:01");

    // A late iteration catches the clock up in one redraw.
    assert!(s.run_iteration(at(4100)).await.clock_redrawn);
    assert_eq!(s.display().printed().last().unwrap().1, "00:00:04");
}

#[tokio::test]
async fn chunked_mode_moves_one_chunk_per_iteration() {
    let storage = media();
    let mut s = scheduler(storage.clone(), MockButton::released(), config(AudioScheduling::Chunked));

    assert_eq!(s.run_iteration(at(0)).await.audio, AudioStep::Streamed(1024));
    assert_eq!(s.run_iteration(at(0)).await.audio, AudioStep::Streamed(1024));
    assert_eq!(s.run_iteration(at(0)).await.audio, AudioStep::Streamed(952));
    assert_eq!(s.context().playlist.current(), 0);

    let last = s.run_iteration(at(0)).await;
    assert_eq!(last.audio, AudioStep::Finished);
    assert_eq!(last.input, InputStep::Idle);
    assert_eq!(s.context().playlist.current(), 1);
    assert_eq!(s.speaker().accepted(), &storage.contents("/songs/song1.wav").unwrap()[..]);

    assert_eq!(s.run_iteration(at(0)).await.audio, AudioStep::Streamed(1024));
    assert_eq!(s.playback_state(), StreamState::Streaming { position: 1024 });
}

#[tokio::test]
async fn full_file_mode_plays_a_whole_song_and_steps_forward() {
    let storage = media();
    let mut s = scheduler(storage.clone(), MockButton::released(), config(AudioScheduling::FullFile));

    let first = s.run_iteration(at(0)).await;
    assert_eq!(first.audio, AudioStep::Finished);
    assert_eq!(first.input, InputStep::Forward);
    assert_eq!(s.speaker().accepted().len(), 3000);
    assert_eq!(s.context().playlist.current(), 1);

    s.run_iteration(at(0)).await;
    assert_eq!(s.speaker().accepted().len(), 3000 + 2048);
    assert_eq!(s.context().playlist.current(), 2);
    assert_eq!(storage.open_count(), 0);
}

#[tokio::test]
async fn missing_song_is_skipped() {
    let storage = media();
    let files = MemStorage::new();
    files.insert("/songs/song2.wav", &storage.contents("/songs/song2.wav").unwrap());
    let mut s = scheduler(files, MockButton::released(), config(AudioScheduling::Chunked));

    assert_eq!(s.run_iteration(at(0)).await.audio, AudioStep::Skipped);
    assert_eq!(s.context().playlist.current(), 1);
    assert_eq!(s.run_iteration(at(0)).await.audio, AudioStep::Streamed(1024));
    assert_eq!(s.speaker().accepted().len(), 1024);
}

#[tokio::test]
async fn button_steps_back_once_per_debounce_window() {
    let button = MockButton::scripted(&[true, true, false, true]);
    let mut s = scheduler(media(), button, config(AudioScheduling::Chunked));

    let pressed = s.run_iteration(at(1000)).await;
    assert_eq!(pressed.input, InputStep::Backward);
    assert_eq!(s.context().playlist.current(), 2);
    // The song in progress is abandoned; the next iteration starts song 3.
    assert_eq!(s.playback_state(), StreamState::Idle);

    // Song 3 fits in one chunk.
    let held = s.run_iteration(at(1100)).await;
    assert_eq!(held.audio, AudioStep::Streamed(1000));
    assert_eq!(held.input, InputStep::Debounced);
    assert_eq!(s.context().playlist.current(), 2);

    let released = s.run_iteration(at(1200)).await;
    assert_eq!(released.audio, AudioStep::Finished);
    assert_eq!(released.input, InputStep::Idle);
    assert_eq!(s.context().playlist.current(), 0);

    assert_eq!(s.run_iteration(at(1300)).await.input, InputStep::Backward);
    assert_eq!(s.context().playlist.current(), 2);
}

#[tokio::test]
async fn full_file_press_steps_back_instead_of_forward() {
    let button = MockButton::scripted(&[false, true]);
    let mut s = scheduler(media(), button, config(AudioScheduling::FullFile));
    assert_eq!(s.run_iteration(at(0)).await.input, InputStep::Forward);
    assert_eq!(s.context().playlist.current(), 1);
    assert_eq!(s.run_iteration(at(10)).await.input, InputStep::Backward);
    assert_eq!(s.context().playlist.current(), 0);
}

#[tokio::test]
async fn slideshow_draws_rows_across_iterations() {
    let mut s = scheduler(media(), MockButton::released(), config(AudioScheduling::Chunked));
    s.start().await;
    assert!(s.slide_in_progress());

    assert_eq!(s.run_iteration(at(0)).await.rows_drawn, 1);
    assert_eq!(s.run_iteration(at(0)).await.rows_drawn, 1);
    assert!(!s.slide_in_progress());
    assert_eq!(s.display().draw_log().len(), 4);
    assert_eq!(s.run_iteration(at(0)).await.rows_drawn, 0);

    let switched = s.run_iteration(at(5000)).await;
    assert_eq!(switched.slide_started, Some(1));
    assert_eq!(switched.rows_drawn, 1);
    assert_eq!(s.context().slideshow.current(), 1);
}

#[tokio::test]
async fn whole_image_mode_draws_at_the_gate() {
    let storage = media();
    let config = DeviceConfig {
        bitmap_rows_per_tick: 0,
        ..config(AudioScheduling::FullFile)
    };
    let mut s = scheduler(storage.clone(), MockButton::released(), config);

    let report = s.run_iteration(at(5000)).await;
    assert_eq!(report.slide_started, Some(1));
    assert_eq!(report.rows_drawn, 0);
    assert!(!s.slide_in_progress());
    assert_eq!(s.display().draw_log().len(), 4);
    assert_eq!(storage.open_count(), 0);
}

#[tokio::test]
async fn missing_image_is_skipped() {
    let storage = media();
    let files = MemStorage::new();
    files.insert("/songs/song1.wav", &storage.contents("/songs/song1.wav").unwrap());
    let mut s = scheduler(files, MockButton::released(), config(AudioScheduling::Chunked));

    let report = s.run_iteration(at(5000)).await;
    assert_eq!(report.slide_started, None);
    assert_eq!(report.rows_drawn, 0);
    assert!(s.display().draw_log().is_empty());
}

#[tokio::test]
async fn slide_change_abandons_the_previous_image() {
    let storage = media();
    let mut s = scheduler(storage.clone(), MockButton::released(), config(AudioScheduling::FullFile));
    s.start().await;
    assert!(s.slide_in_progress());

    let report = s.run_iteration(at(5000)).await;
    assert_eq!(report.slide_started, Some(1));
    assert_eq!(report.rows_drawn, 1);
    // Old decoder closed, new decoder paused, playback done.
    assert_eq!(storage.open_count(), 0);
    assert!(s.slide_in_progress());
}

#[tokio::test]
async fn slide_and_song_never_hold_storage_together() {
    let storage = media();
    storage.insert("/images/image1.bmp", &tall_bmp([0, 0, 255], 40));
    storage.insert("/songs/song1.wav", &song(20 * 1024, 0));
    let config = DeviceConfig {
        bitmap_rows_per_tick: 8,
        ..config(AudioScheduling::Chunked)
    };
    let mut s = scheduler(storage.clone(), MockButton::released(), config);
    s.start().await;

    let mut iterations = 0;
    while s.slide_in_progress() {
        let report = s.run_iteration(at(0)).await;
        assert_eq!(report.rows_drawn, 8);
        assert_eq!(report.audio, AudioStep::Streamed(1024));
        assert!(storage.open_count() <= 1);
        iterations += 1;
    }
    assert_eq!(iterations, 5);
    assert_eq!(storage.peak_open_count(), 1);
    assert_eq!(s.display().draw_log().len(), 80);
    assert_eq!(
        s.speaker().accepted(),
        &storage.contents("/songs/song1.wav").unwrap()[..5 * 1024]
    );
    assert_eq!(s.playback_state(), StreamState::Streaming { position: 5 * 1024 });
}

#[tokio::test]
async fn song_resumes_after_a_paused_iteration() {
    let storage = media();
    let mut s = scheduler(storage.clone(), MockButton::released(), config(AudioScheduling::Chunked));
    for _ in 0..4 {
        s.run_iteration(at(0)).await;
        assert_eq!(storage.open_count(), 0);
    }
    assert_eq!(s.speaker().accepted(), &storage.contents("/songs/song1.wav").unwrap()[..]);
    assert_eq!(storage.peak_open_count(), 1);
}

#[tokio::test]
async fn subsecond_clock_period_is_rejected() {
    let config = DeviceConfig {
        clock_period: Duration::from_millis(500),
        ..config(AudioScheduling::Chunked)
    };
    let speaker = MockTransmitter::new(pcm_config(44_100, 16, 2));
    let display = MockRenderSink::new(240, 320);
    let result = Scheduler::new(media(), speaker, display, MockButton::released(), config, at(0));
    assert!(matches!(
        result,
        Err(firmware::FirmwareError::Config(firmware::ConfigError::FractionalClockPeriod))
    ));
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let config = DeviceConfig {
        playback_chunk: 1001,
        ..DeviceConfig::default()
    };
    let speaker = MockTransmitter::new(pcm_config(44_100, 16, 2));
    let display = MockRenderSink::new(240, 320);
    let result = Scheduler::new(MemStorage::new(), speaker, display, MockButton::released(), config, at(0));
    assert!(result.is_err());
}
