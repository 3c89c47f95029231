//! Property-based tests for audio format math.
//! Verifies invariants hold for ALL inputs, not just fixed examples.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use platform::audio_types::{BitDepth, ChannelCount, SampleRateHz};
use platform::ChannelConfig;

proptest::proptest! {
    /// SampleRateHz::new never panics for any u32 input.
    #[test]
    fn sample_rate_hz_new_never_panics(hz in 0u32..=u32::MAX) {
        let _ = SampleRateHz::new(hz);
    }

    /// The supported range always succeeds.
    #[test]
    fn sample_rate_hz_valid_range_always_ok(hz in 8_000u32..=192_000u32) {
        assert!(SampleRateHz::new(hz).is_ok(),
            "SampleRateHz::new({}) should be Ok within [8000, 192000]", hz);
    }

    /// Anything above the range always fails.
    #[test]
    fn sample_rate_hz_out_of_range_always_err(hz in 192_001u32..=u32::MAX) {
        assert!(SampleRateHz::new(hz).is_err());
    }

    /// bits() inverts from_bits() wherever from_bits succeeds.
    #[test]
    fn bit_depth_round_trips(bits in 0u16..=64u16) {
        if let Ok(depth) = BitDepth::from_bits(bits) {
            assert_eq!(depth.bits(), bits);
            assert_eq!(bits % 8, 0);
        }
    }

    /// Byte rate is frame size times frame rate, with no overflow in range.
    #[test]
    fn bytes_per_second_is_rate_times_frame(
        hz in 8_000u32..=192_000u32,
        bits in proptest::sample::select(vec![8u16, 16, 24, 32]),
        channels in 1u8..=2u8,
    ) {
        let config = ChannelConfig {
            sample_rate: SampleRateHz::new(hz).unwrap(),
            bit_depth: BitDepth::from_bits(bits).unwrap(),
            channels: ChannelCount::new(channels).unwrap(),
        };
        let frame = u32::from(bits / 8) * u32::from(channels);
        assert_eq!(config.bytes_per_frame(), frame);
        assert_eq!(config.bytes_per_second(), hz * frame);
    }
}
