//! Full supervisory cycle against simulated hardware and a simulated clock.

use linebot_core::supervisor::{ProfileSet, Supervisor};
use linebot_core::{DriveCommand, SupervisorState};
use linebot_hardware::{SimulatedLineSensor, SimulatedMotor, SimulatedTouch};
use linebot_traits::clock::SimClock;
use std::time::Duration;

// Brightness levels against the follow calibration (520/450) and the
// waypoint calibration (550/450): 400 reads Black, 480 reads Gray, 600
// reads White under both.
const BLACK: u16 = 400;
const GRAY: u16 = 480;
const WHITE: u16 = 600;

fn simple_profiles() -> ProfileSet {
    // avg_window 1 so each scripted reading classifies directly.
    let cfg: linebot_config::Config = toml::from_str(
        r#"
        [profile.follow]
        avg_window = 1
        [profile.find_line]
        avg_window = 1
        [profile.waypoint]
        avg_window = 1
        deadline_ms = 1000
        [profile.resume]
        avg_window = 1
        deadline_ms = 2000
        "#,
    )
    .expect("valid config");
    cfg.validate().expect("config validates");
    ProfileSet::from_config(&cfg)
}

fn build(
    left: SimulatedLineSensor,
    right: SimulatedLineSensor,
    touch: SimulatedTouch,
    clock: SimClock,
) -> Supervisor {
    Supervisor::builder()
        .with_light_sensors(left, right)
        .with_drive(SimulatedMotor::new("left"), SimulatedMotor::new("right"))
        .with_touch(touch)
        .with_clock(Box::new(clock))
        .with_profiles(simple_profiles())
        .with_pivot_ticks(2)
        .build()
        .expect("supervisor builds")
}

#[test]
fn start_probe_off_line_goes_to_find_line() {
    let clock = SimClock::new();
    let mut sup = build(
        SimulatedLineSensor::steady(WHITE),
        SimulatedLineSensor::steady(WHITE),
        SimulatedTouch::never(),
        clock.clone(),
    );
    sup.begin();
    assert_eq!(sup.state(), SupervisorState::Start);
    sup.step().expect("start probe");
    assert_eq!(sup.state(), SupervisorState::FindLine);
    // The probe consumed the settle delay on the simulated clock.
    assert_eq!(clock.elapsed(), Duration::from_millis(500));
}

#[test]
fn start_probe_on_line_goes_to_follow() {
    let mut sup = build(
        SimulatedLineSensor::steady(BLACK),
        SimulatedLineSensor::steady(BLACK),
        SimulatedTouch::never(),
        SimClock::new(),
    );
    sup.begin();
    sup.step().expect("start probe");
    assert_eq!(sup.state(), SupervisorState::Follow);
}

#[test]
fn find_line_acquires_and_hands_over_to_follow() {
    // Off the line for two ticks, then both sensors acquire it. Under the
    // find-line calibration (530/400) 600 is White and 350 is Black.
    let clock = SimClock::new();
    let mut sup = build(
        SimulatedLineSensor::scripted([600, 600, 350]),
        SimulatedLineSensor::scripted([600, 600, 350]),
        SimulatedTouch::never(),
        clock,
    );
    sup.begin();
    sup.step().expect("start probe"); // WHITE/WHITE under follow -> FindLine
    assert_eq!(sup.state(), SupervisorState::FindLine);
    sup.step().expect("find line");
    assert_eq!(sup.state(), SupervisorState::Follow);
    // The episode ends halted.
    assert_eq!(sup.last_drive(), DriveCommand::STOP);
}

#[test]
fn full_cycle_visits_every_state() {
    // Reads per sensor, episode by episode:
    //   Start      1 read  (Black -> Follow)
    //   Follow     3 reads (straight, veer, both Gray -> Lost)
    //   TimedF1    6 reads (all Black; deadline 1000ms after 5 ticks)
    //   TimedF2    1 read  (both Gray -> Lost -> Stop)
    //   Stop       0 reads (touch pressed on 2nd poll)
    //   Resume     1 read  (both Gray -> Lost -> Follow)
    let left = SimulatedLineSensor::scripted([
        BLACK, // start probe
        BLACK, BLACK, GRAY, // follow
        BLACK, BLACK, BLACK, BLACK, BLACK, BLACK, // timed 1
        GRAY,  // timed 2
        GRAY,  // resume
    ]);
    let right = SimulatedLineSensor::scripted([
        BLACK, // start probe
        BLACK, WHITE, GRAY, // follow
        BLACK, BLACK, BLACK, BLACK, BLACK, BLACK, // timed 1
        GRAY,  // timed 2
        GRAY,  // resume
    ]);
    let clock = SimClock::new();
    let mut sup = build(left, right, SimulatedTouch::press_after(1), clock.clone());

    sup.begin();
    let expected = [
        SupervisorState::Follow,
        SupervisorState::TimedFollow1,
        SupervisorState::TimedFollow2,
        SupervisorState::Stop,
        SupervisorState::ResumeFollow,
        SupervisorState::Follow,
    ];
    for want in expected {
        sup.step().expect("episode runs");
        assert_eq!(sup.state(), want);
    }
    // Every episode leaves the drive halted.
    assert_eq!(sup.last_drive(), DriveCommand::STOP);
}

#[test]
fn stop_waits_for_touch_then_resumes() {
    // Jump straight into the cycle: probe on-line, lose immediately, run the
    // two timed legs to the waypoint, then verify the touch gate.
    let left = SimulatedLineSensor::scripted([BLACK, GRAY, GRAY, GRAY]);
    let right = SimulatedLineSensor::scripted([BLACK, GRAY, GRAY, GRAY]);
    let mut sup = build(left, right, SimulatedTouch::press_after(3), SimClock::new());

    sup.begin();
    sup.step().expect("start"); // -> Follow
    sup.step().expect("follow loses"); // -> TimedFollow1
    sup.step().expect("timed 1 loses"); // -> TimedFollow2
    sup.step().expect("timed 2 loses"); // -> Stop
    assert_eq!(sup.state(), SupervisorState::Stop);
    sup.step().expect("stop waits for touch");
    assert_eq!(sup.state(), SupervisorState::ResumeFollow);
}
