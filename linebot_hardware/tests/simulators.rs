use linebot_hardware::{SimulatedLineSensor, SimulatedMotor, SimulatedOdometer, SimulatedTouch};
use linebot_traits::{DriveMotor, LightSensor, Odometer, TouchSensor};
use rstest::rstest;

#[test]
fn scripted_sensor_repeats_last_value() {
    let mut s = SimulatedLineSensor::scripted([600, 480, 300]);
    assert_eq!(s.brightness().expect("read"), 600);
    assert_eq!(s.brightness().expect("read"), 480);
    assert_eq!(s.brightness().expect("read"), 300);
    assert_eq!(s.brightness().expect("read"), 300);
    assert_eq!(s.brightness().expect("read"), 300);
}

#[test]
fn steady_sensor_never_changes() {
    let mut s = SimulatedLineSensor::steady(512);
    for _ in 0..10 {
        assert_eq!(s.brightness().expect("read"), 512);
    }
}

#[test]
fn motor_handle_tracks_last_command() {
    let mut m = SimulatedMotor::new("left");
    let h = m.handle();
    assert_eq!(h.last_pwm(), 0);
    m.set_pwm(60).expect("set");
    assert_eq!(h.last_pwm(), 60);
    m.set_pwm(-40).expect("set");
    assert_eq!(h.last_pwm(), -40);
    m.stop().expect("stop");
    assert_eq!(h.last_pwm(), 0);
}

#[rstest]
#[case(0, true)]
#[case(3, false)]
fn touch_presses_after_configured_polls(#[case] press_after: u32, #[case] first: bool) {
    let mut t = SimulatedTouch::press_after(press_after);
    assert_eq!(t.is_pressed().expect("poll"), first);
}

#[test]
fn touch_press_after_three_polls() {
    let mut t = SimulatedTouch::press_after(3);
    assert!(!t.is_pressed().expect("poll 0"));
    assert!(!t.is_pressed().expect("poll 1"));
    assert!(!t.is_pressed().expect("poll 2"));
    assert!(t.is_pressed().expect("poll 3"));
    assert!(t.is_pressed().expect("stays pressed"));
}

#[test]
fn odometer_integrates_motor_duty() {
    let mut left = SimulatedMotor::new("left");
    let mut right = SimulatedMotor::new("right");
    let mut odo = SimulatedOdometer::attached(left.handle(), right.handle());

    assert_eq!(odo.counts().expect("idle"), (0, 0));
    left.set_pwm(60).expect("set");
    right.set_pwm(40).expect("set");
    assert_eq!(odo.counts().expect("tick"), (6, 4));
    assert_eq!(odo.counts().expect("tick"), (12, 8));
    left.set_pwm(-60).expect("reverse");
    assert_eq!(odo.counts().expect("tick"), (6, 12));
}
