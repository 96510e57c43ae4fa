//! Simulated rig assembly: a scripted demo course wired into the supervisor.

use linebot_core::supervisor::{ProfileSet, Supervisor};
use linebot_hardware::{SimulatedLineSensor, SimulatedMotor, SimulatedOdometer, SimulatedTouch};

// Readings against the default calibrations. The classifiers average the
// last `avg_window` readings (5 by default), so each phase of the script
// holds its value long enough for the windowed average to cross a cutoff.
const TAPE: u16 = 300;
const EDGE: u16 = 480;
const FLOOR: u16 = 600;

/// Scripted sensor pair that walks the robot through one full supervisory
/// cycle: acquire the line, follow until the loss pair, run both timed legs
/// to the deadline, then lose again into the waypoint stop and resume. Once
/// the script is exhausted both sensors read the edge value, so every
/// following episode takes the loss path and the cycle keeps repeating.
pub fn demo_course() -> (SimulatedLineSensor, SimulatedLineSensor) {
    let mut script = Vec::new();
    // Start probe: one unwindowed reading off the line.
    script.push(FLOOR);
    // Find line: seek over floor, then enough tape for the window to go Black.
    script.extend([FLOOR, FLOOR, TAPE, TAPE, TAPE, TAPE]);
    // Follow: straight on tape until the window drifts up into the Gray pair.
    script.extend([TAPE, EDGE, EDGE, EDGE, EDGE, EDGE]);
    // Two timed legs on solid tape, each running out its deadline.
    script.extend([TAPE; 12]);
    // Tail: repeats forever, so each later episode loses immediately.
    script.push(EDGE);
    let left = SimulatedLineSensor::scripted(script.clone());
    let right = SimulatedLineSensor::scripted(script);
    (left, right)
}

/// Assemble the simulated robot. Returns the supervisor and an odometer
/// attached to the simulated motors so telemetry reflects the drive.
pub fn build_rig(cfg: &linebot_config::Config) -> eyre::Result<(Supervisor, SimulatedOdometer)> {
    let (left_sensor, right_sensor) = demo_course();
    let left_motor = SimulatedMotor::new("left");
    let right_motor = SimulatedMotor::new("right");
    let odometer = SimulatedOdometer::attached(left_motor.handle(), right_motor.handle());

    let supervisor = Supervisor::builder()
        .with_light_sensors(left_sensor, right_sensor)
        .with_drive(left_motor, right_motor)
        .with_touch(SimulatedTouch::press_after(3))
        .with_profiles(ProfileSet::from_config(cfg))
        .with_tick_ms(cfg.supervisor.tick_ms)
        .with_settle_ms(cfg.supervisor.settle_ms)
        .with_pivot_ticks(cfg.find_line.pivot_ticks)
        .try_build()?;

    Ok((supervisor, odometer))
}
