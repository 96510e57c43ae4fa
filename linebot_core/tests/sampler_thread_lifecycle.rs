//! Test sampler thread lifecycle and cleanup to prevent thread leaks.
//!
//! Verifies that:
//! - Threads are properly cleaned up when MotionSampler is dropped
//! - Multiple samplers can be created and destroyed without accumulating threads
//! - Samples actually land in the shared ring while the thread runs

use linebot_core::buffer::SharedSampleBuffer;
use linebot_core::sampler::MotionSampler;
use linebot_hardware::{SimulatedMotor, SimulatedOdometer};
use linebot_traits::DriveMotor;
use linebot_traits::clock::MonotonicClock;
use std::time::Duration;

fn sim_odometer() -> SimulatedOdometer {
    let mut left = SimulatedMotor::new("left");
    let mut right = SimulatedMotor::new("right");
    left.set_pwm(60).expect("sim motor accepts pwm");
    right.set_pwm(40).expect("sim motor accepts pwm");
    SimulatedOdometer::attached(left.handle(), right.handle())
}

#[test]
fn sampler_fills_the_ring_and_exits_on_drop() {
    let buffer = SharedSampleBuffer::new(1000);
    let sampler = MotionSampler::spawn(sim_odometer(), buffer.clone(), 100, MonotonicClock::new());

    // At 100 Hz a short wait is enough for several samples.
    std::thread::sleep(Duration::from_millis(100));
    assert!(buffer.count() > 0, "sampler produced no samples");

    drop(sampler);
    let after = buffer.count();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(buffer.count(), after, "sampler kept writing after drop");
}

#[test]
fn multiple_samplers_dont_leak_threads() {
    for _ in 0..10 {
        let buffer = SharedSampleBuffer::new(100);
        let sampler =
            MotionSampler::spawn(sim_odometer(), buffer.clone(), 200, MonotonicClock::new());
        std::thread::sleep(Duration::from_millis(10));
        drop(sampler);
    }
    // Test passes if we reach here without hanging or panicking
}

#[test]
fn samples_carry_advancing_encoder_counts() {
    let buffer = SharedSampleBuffer::new(1000);
    let sampler = MotionSampler::spawn(sim_odometer(), buffer.clone(), 100, MonotonicClock::new());
    std::thread::sleep(Duration::from_millis(120));
    drop(sampler);

    let ring = buffer.lock();
    assert!(ring.count() >= 2);
    let first = ring.get(0).expect("first sample");
    let second = ring.get(1).expect("second sample");
    // The simulated odometer integrates 60/40 duty as +6/+4 per poll.
    assert_eq!(second.left - first.left, 6);
    assert_eq!(second.right - first.right, 4);
}
