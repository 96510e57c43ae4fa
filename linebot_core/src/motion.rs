//! Bang-bang steering primitive: classification pair in, drive command out.

use crate::classify::{SensorClass, Thresholds};
use std::time::Duration;

pub use linebot_config::PWM_LIMIT;

/// One differential drive command. Fully replaces the previous command each
/// tick; there is no blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveCommand {
    pub left: i8,
    pub right: i8,
}

impl DriveCommand {
    pub const STOP: Self = Self { left: 0, right: 0 };

    /// Build a command with both duties clamped into the PWM range.
    pub fn new(left: i16, right: i16) -> Self {
        let lim = i16::from(PWM_LIMIT);
        Self {
            left: left.clamp(-lim, lim) as i8,
            right: right.clamp(-lim, lim) as i8,
        }
    }
}

/// Which classifications count as "on the line". Later robot variants
/// loosened Black-only to not-White to tolerate edge-of-tape readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinePredicate {
    #[default]
    BlackOnly,
    NotWhite,
}

impl LinePredicate {
    #[inline]
    pub fn on_line(self, class: SensorClass) -> bool {
        match self {
            Self::BlackOnly => class == SensorClass::Black,
            Self::NotWhite => class != SensorClass::White,
        }
    }
}

impl From<linebot_config::OnLine> for LinePredicate {
    fn from(v: linebot_config::OnLine) -> Self {
        match v {
            linebot_config::OnLine::Black => Self::BlackOnly,
            linebot_config::OnLine::NotWhite => Self::NotWhite,
        }
    }
}

/// Which simultaneous classification pair terminates following.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LossCondition {
    #[default]
    BothGray,
    BothWhite,
}

impl LossCondition {
    #[inline]
    pub fn lost(self, left: SensorClass, right: SensorClass) -> bool {
        match self {
            Self::BothGray => left == SensorClass::Gray && right == SensorClass::Gray,
            Self::BothWhite => left == SensorClass::White && right == SensorClass::White,
        }
    }
}

impl From<linebot_config::LostWhen> for LossCondition {
    fn from(v: linebot_config::LostWhen) -> Self {
        match v {
            linebot_config::LostWhen::BothGray => Self::BothGray,
            linebot_config::LostWhen::BothWhite => Self::BothWhite,
        }
    }
}

/// Speeds, thresholds, predicates and timing for one operating mode.
/// Call sites never hard-code speeds or predicate strictness; they select a
/// profile and let `steer` do the rest.
#[derive(Debug, Clone)]
pub struct MotionProfile {
    pub name: &'static str,
    pub thresholds: Thresholds,
    pub avg_window: usize,
    pub forward_pwm: i8,
    pub pivot_pwm: i8,
    pub on_line: LinePredicate,
    pub lost_when: LossCondition,
    pub tick: Duration,
    /// Wall-clock bound for timed segments; None for unbounded profiles.
    pub deadline: Option<Duration>,
}

impl MotionProfile {
    pub fn from_cfg(name: &'static str, cfg: &linebot_config::ProfileCfg) -> Self {
        Self {
            name,
            thresholds: Thresholds::new(cfg.high, cfg.low),
            avg_window: cfg.avg_window,
            forward_pwm: cfg.forward_pwm,
            pivot_pwm: cfg.pivot_pwm,
            on_line: cfg.on_line.into(),
            lost_when: cfg.lost_when.into(),
            tick: Duration::from_millis(cfg.tick_ms),
            deadline: cfg.deadline_ms.map(Duration::from_millis),
        }
    }

    fn forward(&self) -> DriveCommand {
        DriveCommand::new(i16::from(self.forward_pwm), i16::from(self.forward_pwm))
    }
}

/// One steering decision: the drive command to apply plus the follow
/// sub-state it corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steer {
    Straight(DriveCommand),
    VeerLeft(DriveCommand),
    VeerRight(DriveCommand),
    /// Terminal: the loss condition held on this tick.
    Lost,
}

impl Steer {
    pub fn command(&self) -> DriveCommand {
        match self {
            Self::Straight(c) | Self::VeerLeft(c) | Self::VeerRight(c) => *c,
            Self::Lost => DriveCommand::STOP,
        }
    }
}

/// Bang-bang steering for one tick.
///
/// Both sides on the line drive straight; one side off pivots toward the
/// side still on the line (that wheel stopped, the other at pivot speed).
/// The loss condition is checked before the on-line split so it always wins.
/// Any pair not explicitly enumerated falls back to the straight rule, so a
/// drive command is produced on every tick.
pub fn steer(left: SensorClass, right: SensorClass, profile: &MotionProfile) -> Steer {
    if profile.lost_when.lost(left, right) {
        return Steer::Lost;
    }
    let pivot = i16::from(profile.pivot_pwm);
    match (profile.on_line.on_line(left), profile.on_line.on_line(right)) {
        (true, true) => Steer::Straight(profile.forward()),
        (true, false) => Steer::VeerLeft(DriveCommand::new(0, pivot)),
        (false, true) => Steer::VeerRight(DriveCommand::new(pivot, 0)),
        // Tie-break: both off the line but not a loss pair.
        (false, false) => Steer::Straight(profile.forward()),
    }
}
