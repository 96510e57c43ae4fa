use linebot_core::util::{period_ms, period_us};
use rstest::rstest;

#[rstest]
#[case(1, 1_000_000)]
#[case(5, 200_000)]
#[case(100, 10_000)]
#[case(1_000_000, 1)]
// 0 Hz is clamped to 1 Hz instead of dividing by zero.
#[case(0, 1_000_000)]
fn period_us_matches_rate(#[case] hz: u32, #[case] expected: u64) {
    assert_eq!(period_us(hz), expected);
}

#[rstest]
#[case(1, 1000)]
#[case(5, 200)]
#[case(200, 5)]
// Sub-millisecond periods floor at 1 ms.
#[case(10_000, 1)]
#[case(0, 1000)]
fn period_ms_matches_rate(#[case] hz: u32, #[case] expected: u64) {
    assert_eq!(period_ms(hz), expected);
}
