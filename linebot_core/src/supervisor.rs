//! Top-level supervisory machine and its type-state builder.
//!
//! The supervisor owns the sensors, the drive, and the touch sensor, and
//! dispatches between episode loops (find-line, follow, timed follow, stop).
//! Each `step()` runs the current state's episode to its terminal condition
//! and moves to the next supervisory state; the machine has no terminal state
//! and cycles until the caller stops it.
//!
//! The builder enforces at compile time that light sensors, drive, and touch
//! are provided before `build()` is available. `try_build()` is always
//! available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use linebot_traits::clock::{Clock, MonotonicClock};
use linebot_traits::{DriveMotor, LightSensor, StatusDisplay, TouchSensor};

use crate::classify::{BrightnessClassifier, SensorClass};
use crate::error::{BuildError, Result};
use crate::fsm::{FindLineState, SegmentOutcome, SupervisorState, follow_transition};
use crate::hw_error::map_hw_error;
use crate::motion::{DriveCommand, MotionProfile, Steer, steer};

/// The four per-mode motion profiles the supervisor dispatches between.
#[derive(Debug, Clone)]
pub struct ProfileSet {
    pub follow: MotionProfile,
    pub find_line: MotionProfile,
    pub waypoint: MotionProfile,
    pub resume: MotionProfile,
}

impl ProfileSet {
    pub fn from_config(cfg: &linebot_config::Config) -> Self {
        Self {
            follow: MotionProfile::from_cfg("follow", &cfg.profiles.follow),
            find_line: MotionProfile::from_cfg("find_line", &cfg.profiles.find_line),
            waypoint: MotionProfile::from_cfg("waypoint", &cfg.profiles.waypoint),
            resume: MotionProfile::from_cfg("resume", &cfg.profiles.resume),
        }
    }
}

impl Default for ProfileSet {
    fn default() -> Self {
        Self::from_config(&linebot_config::Config::default())
    }
}

/// Display that logs state labels through tracing. Used when no physical
/// display is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceDisplay;

impl StatusDisplay for TraceDisplay {
    fn announce(&mut self, label: &str) {
        tracing::info!(state = label, "state entered");
    }
}

/// Dynamic (boxed) supervisor over the hardware trait objects.
pub struct Supervisor {
    left_light: Box<dyn LightSensor>,
    right_light: Box<dyn LightSensor>,
    left_motor: Box<dyn DriveMotor>,
    right_motor: Box<dyn DriveMotor>,
    touch: Box<dyn TouchSensor>,
    display: Box<dyn StatusDisplay>,
    clock: Arc<dyn Clock + Send + Sync>,
    profiles: ProfileSet,
    tick: Duration,
    settle: Duration,
    pivot_ticks: u32,
    state: SupervisorState,
    last_drive: DriveCommand,
}

impl core::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Supervisor")
            .field("state", &self.state)
            .field("last_drive", &self.last_drive)
            .finish()
    }
}

impl Supervisor {
    /// Start building a Supervisor.
    pub fn builder() -> SupervisorBuilder<Missing, Missing, Missing> {
        SupervisorBuilder::default()
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Last drive command applied to the motors.
    pub fn last_drive(&self) -> DriveCommand {
        self.last_drive
    }

    /// Reset to the Start state. Call before a new run.
    pub fn begin(&mut self) {
        self.state = SupervisorState::Start;
        self.last_drive = DriveCommand::STOP;
        self.display.announce(self.state.label());
    }

    /// Run the current state's episode to its terminal condition and move to
    /// the next supervisory state.
    pub fn step(&mut self) -> Result<()> {
        let next = match self.state {
            SupervisorState::Start => self.run_start_probe()?,
            SupervisorState::FindLine => {
                self.run_find_line()?;
                SupervisorState::Follow
            }
            SupervisorState::Follow => {
                self.run_follow()?;
                SupervisorState::TimedFollow1
            }
            SupervisorState::TimedFollow1 => {
                // First timed leg always hands over to the second; only the
                // second leg's outcome decides whether the waypoint was hit.
                let outcome = self.run_timed_follow(self.profiles.waypoint.clone())?;
                tracing::debug!(?outcome, "first timed leg finished");
                SupervisorState::TimedFollow2
            }
            SupervisorState::TimedFollow2 => {
                match self.run_timed_follow(self.profiles.waypoint.clone())? {
                    SegmentOutcome::Lost => SupervisorState::Stop,
                    SegmentOutcome::SegmentComplete => SupervisorState::Follow,
                }
            }
            SupervisorState::Stop => {
                self.run_stop_wait()?;
                SupervisorState::ResumeFollow
            }
            SupervisorState::ResumeFollow => {
                // Either outcome rejoins the main follow loop.
                let outcome = self.run_timed_follow(self.profiles.resume.clone())?;
                tracing::debug!(?outcome, "resume leg finished");
                SupervisorState::Follow
            }
        };
        tracing::info!(from = self.state.label(), to = next.label(), "transition");
        self.state = next;
        self.display.announce(next.label());
        Ok(())
    }

    /// Drive the machine until `stop` returns true, pausing one supervisor
    /// tick between episodes.
    pub fn run_until<F>(&mut self, stop: F) -> Result<()>
    where
        F: Fn() -> bool,
    {
        while !stop() {
            self.step()?;
            self.clock.sleep(self.tick);
        }
        self.halt().wrap_err("stopping drive on shutdown")?;
        Ok(())
    }

    // ── Episodes ─────────────────────────────────────────────────────────────

    /// Start state: let the sensors settle, then probe the surface once.
    /// Off the line on both sides means the line must be acquired first.
    fn run_start_probe(&mut self) -> Result<SupervisorState> {
        self.clock.sleep(self.settle);
        let profile = self.profiles.follow.clone();
        let (left, right) = self.classify_pair_once(&profile)?;
        let on = profile.on_line;
        let next = if !on.on_line(left) && !on.on_line(right) {
            SupervisorState::FindLine
        } else {
            SupervisorState::Follow
        };
        Ok(next)
    }

    /// Drive straight until both sensors acquire the line, then pivot a fixed
    /// number of ticks to align with it.
    fn run_find_line(&mut self) -> Result<()> {
        let profile = self.profiles.find_line.clone();
        let mut left_cls = BrightnessClassifier::new(profile.thresholds, profile.avg_window);
        let mut right_cls = BrightnessClassifier::new(profile.thresholds, profile.avg_window);
        let mut state = FindLineState::SeekStraight;
        let mut pivot_left = self.pivot_ticks;
        let forward = DriveCommand::new(
            i16::from(profile.forward_pwm),
            i16::from(profile.forward_pwm),
        );
        let pivot = DriveCommand::new(0, i16::from(profile.pivot_pwm));

        while state != FindLineState::Acquired {
            match state {
                FindLineState::SeekStraight => {
                    let (l, r) = self.classify_pair(&mut left_cls, &mut right_cls)?;
                    if profile.on_line.on_line(l) && profile.on_line.on_line(r) {
                        tracing::debug!("line acquired, pivoting to align");
                        state = FindLineState::PivotOntoLine;
                    } else {
                        self.apply(forward)?;
                    }
                }
                FindLineState::PivotOntoLine => {
                    if pivot_left == 0 {
                        state = FindLineState::Acquired;
                        continue;
                    }
                    self.apply(pivot)?;
                    pivot_left -= 1;
                }
                FindLineState::Acquired => unreachable!("loop exits before Acquired runs"),
            }
            self.clock.sleep(profile.tick);
        }
        self.halt()?;
        Ok(())
    }

    /// Follow the line until the profile's loss condition holds.
    fn run_follow(&mut self) -> Result<()> {
        let profile = self.profiles.follow.clone();
        // No deadline: only the loss condition ends the episode.
        self.follow_segment(&profile, None)?;
        Ok(())
    }

    fn run_timed_follow(&mut self, profile: MotionProfile) -> Result<SegmentOutcome> {
        let deadline = profile.deadline.ok_or_else(|| {
            eyre::Report::new(BuildError::InvalidConfig(
                "timed follow requires a profile deadline",
            ))
        })?;
        self.follow_segment(&profile, Some(deadline))
    }

    /// The follow-tick engine shared by the plain and timed episodes.
    ///
    /// The loss condition is evaluated before the deadline on every tick, so
    /// a simultaneous loss-and-expiry reports Lost. Without a deadline the
    /// loop runs until loss.
    fn follow_segment(
        &mut self,
        profile: &MotionProfile,
        deadline: Option<Duration>,
    ) -> Result<SegmentOutcome> {
        let mut left_cls = BrightnessClassifier::new(profile.thresholds, profile.avg_window);
        let mut right_cls = BrightnessClassifier::new(profile.thresholds, profile.avg_window);
        let epoch = self.clock.now();

        let outcome = loop {
            let (l, r) = self.classify_pair(&mut left_cls, &mut right_cls)?;
            let decision = steer(l, r, profile);
            tracing::trace!(state = ?follow_transition(&decision), ?l, ?r, "follow tick");
            if let Steer::Lost = decision {
                break SegmentOutcome::Lost;
            }
            if let Some(deadline) = deadline
                && self.clock.now().saturating_duration_since(epoch) >= deadline
            {
                break SegmentOutcome::SegmentComplete;
            }
            self.apply(decision.command())?;
            self.clock.sleep(profile.tick);
        };
        self.halt()?;
        tracing::debug!(profile = profile.name, ?outcome, "follow segment done");
        Ok(outcome)
    }

    /// Spin in place at the waypoint until the touch sensor is pressed.
    fn run_stop_wait(&mut self) -> Result<()> {
        let pivot = DriveCommand::new(0, i16::from(self.profiles.waypoint.pivot_pwm));
        loop {
            let pressed = self
                .touch
                .is_pressed()
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err("polling touch sensor")?;
            if pressed {
                break;
            }
            self.apply(pivot)?;
            self.clock.sleep(self.tick);
        }
        self.halt()?;
        Ok(())
    }

    // ── Hardware access ──────────────────────────────────────────────────────

    fn read_pair(&mut self) -> Result<(u16, u16)> {
        let left = self
            .left_light
            .brightness()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("reading left light sensor")?;
        let right = self
            .right_light
            .brightness()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("reading right light sensor")?;
        Ok((left, right))
    }

    fn classify_pair(
        &mut self,
        left_cls: &mut BrightnessClassifier,
        right_cls: &mut BrightnessClassifier,
    ) -> Result<(SensorClass, SensorClass)> {
        let (l, r) = self.read_pair()?;
        Ok((left_cls.push(l), right_cls.push(r)))
    }

    /// Single unwindowed classification, used by the Start probe.
    fn classify_pair_once(&mut self, profile: &MotionProfile) -> Result<(SensorClass, SensorClass)> {
        let (l, r) = self.read_pair()?;
        Ok((profile.thresholds.classify(l), profile.thresholds.classify(r)))
    }

    fn apply(&mut self, cmd: DriveCommand) -> Result<()> {
        self.left_motor
            .set_pwm(cmd.left)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("driving left motor")?;
        self.right_motor
            .set_pwm(cmd.right)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("driving right motor")?;
        self.last_drive = cmd;
        Ok(())
    }

    fn halt(&mut self) -> Result<()> {
        self.left_motor
            .stop()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("stopping left motor")?;
        self.right_motor
            .stop()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("stopping right motor")?;
        self.last_drive = DriveCommand::STOP;
        Ok(())
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Supervisor`. All fields are validated on `build()`.
pub struct SupervisorBuilder<S, D, T> {
    left_light: Option<Box<dyn LightSensor>>,
    right_light: Option<Box<dyn LightSensor>>,
    left_motor: Option<Box<dyn DriveMotor>>,
    right_motor: Option<Box<dyn DriveMotor>>,
    touch: Option<Box<dyn TouchSensor>>,
    display: Option<Box<dyn StatusDisplay>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    profiles: Option<ProfileSet>,
    tick_ms: Option<u64>,
    settle_ms: Option<u64>,
    pivot_ticks: Option<u32>,
    _s: PhantomData<S>,
    _d: PhantomData<D>,
    _t: PhantomData<T>,
}

impl Default for SupervisorBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            left_light: None,
            right_light: None,
            left_motor: None,
            right_motor: None,
            touch: None,
            display: None,
            clock: None,
            profiles: None,
            tick_ms: None,
            settle_ms: None,
            pivot_ticks: None,
            _s: PhantomData,
            _d: PhantomData,
            _t: PhantomData,
        }
    }
}

/// Validate configuration and construct a `Supervisor`.
///
/// This is the single source of truth for validation, used by
/// `SupervisorBuilder::try_build()`.
#[allow(clippy::too_many_arguments)]
fn validate_and_build(
    left_light: Box<dyn LightSensor>,
    right_light: Box<dyn LightSensor>,
    left_motor: Box<dyn DriveMotor>,
    right_motor: Box<dyn DriveMotor>,
    touch: Box<dyn TouchSensor>,
    display: Option<Box<dyn StatusDisplay>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    profiles: ProfileSet,
    tick_ms: u64,
    settle_ms: u64,
    pivot_ticks: u32,
) -> Result<Supervisor> {
    if tick_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "tick_ms must be > 0",
        )));
    }
    if pivot_ticks == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "pivot_ticks must be > 0",
        )));
    }
    if profiles.waypoint.deadline.is_none() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "waypoint profile requires a deadline",
        )));
    }
    if profiles.resume.deadline.is_none() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "resume profile requires a deadline",
        )));
    }
    for p in [
        &profiles.follow,
        &profiles.find_line,
        &profiles.waypoint,
        &profiles.resume,
    ] {
        if p.thresholds.low >= p.thresholds.high {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "profile low threshold must be below high",
            )));
        }
        if p.forward_pwm <= 0 || p.pivot_pwm <= 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "profile speeds must be > 0",
            )));
        }
    }

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };

    Ok(Supervisor {
        left_light,
        right_light,
        left_motor,
        right_motor,
        touch,
        display: display.unwrap_or_else(|| Box::new(TraceDisplay)),
        clock,
        profiles,
        tick: Duration::from_millis(tick_ms),
        settle: Duration::from_millis(settle_ms),
        pivot_ticks,
        state: SupervisorState::Start,
        last_drive: DriveCommand::STOP,
    })
}

impl<S, D, T> SupervisorBuilder<S, D, T> {
    /// Fallible build available in any type-state; returns detailed error for
    /// missing pieces.
    pub fn try_build(self) -> Result<Supervisor> {
        let (Some(left_light), Some(right_light)) = (self.left_light, self.right_light) else {
            return Err(eyre::Report::new(BuildError::MissingSensors));
        };
        let (Some(left_motor), Some(right_motor)) = (self.left_motor, self.right_motor) else {
            return Err(eyre::Report::new(BuildError::MissingDrive));
        };
        let touch = self
            .touch
            .ok_or_else(|| eyre::Report::new(BuildError::MissingTouch))?;

        let defaults = linebot_config::SupervisorCfg::default();
        validate_and_build(
            left_light,
            right_light,
            left_motor,
            right_motor,
            touch,
            self.display,
            self.clock,
            self.profiles.unwrap_or_default(),
            self.tick_ms.unwrap_or(defaults.tick_ms),
            self.settle_ms.unwrap_or(defaults.settle_ms),
            self.pivot_ticks
                .unwrap_or_else(|| linebot_config::FindLineCfg::default().pivot_ticks),
        )
    }
}

/// Chainable setters that do not affect type-state.
impl<S, D, T> SupervisorBuilder<S, D, T> {
    pub fn with_display(mut self, display: impl StatusDisplay + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock`
    /// when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    pub fn with_profiles(mut self, profiles: ProfileSet) -> Self {
        self.profiles = Some(profiles);
        self
    }
    pub fn with_tick_ms(mut self, tick_ms: u64) -> Self {
        self.tick_ms = Some(tick_ms);
        self
    }
    pub fn with_settle_ms(mut self, settle_ms: u64) -> Self {
        self.settle_ms = Some(settle_ms);
        self
    }
    pub fn with_pivot_ticks(mut self, ticks: u32) -> Self {
        self.pivot_ticks = Some(ticks.max(1));
        self
    }
}

// Setters that advance type-state
impl<D, T> SupervisorBuilder<Missing, D, T> {
    pub fn with_light_sensors(
        self,
        left: impl LightSensor + 'static,
        right: impl LightSensor + 'static,
    ) -> SupervisorBuilder<Set, D, T> {
        SupervisorBuilder {
            left_light: Some(Box::new(left)),
            right_light: Some(Box::new(right)),
            left_motor: self.left_motor,
            right_motor: self.right_motor,
            touch: self.touch,
            display: self.display,
            clock: self.clock,
            profiles: self.profiles,
            tick_ms: self.tick_ms,
            settle_ms: self.settle_ms,
            pivot_ticks: self.pivot_ticks,
            _s: PhantomData,
            _d: PhantomData,
            _t: PhantomData,
        }
    }
}

impl<S, T> SupervisorBuilder<S, Missing, T> {
    pub fn with_drive(
        self,
        left: impl DriveMotor + 'static,
        right: impl DriveMotor + 'static,
    ) -> SupervisorBuilder<S, Set, T> {
        SupervisorBuilder {
            left_light: self.left_light,
            right_light: self.right_light,
            left_motor: Some(Box::new(left)),
            right_motor: Some(Box::new(right)),
            touch: self.touch,
            display: self.display,
            clock: self.clock,
            profiles: self.profiles,
            tick_ms: self.tick_ms,
            settle_ms: self.settle_ms,
            pivot_ticks: self.pivot_ticks,
            _s: PhantomData,
            _d: PhantomData,
            _t: PhantomData,
        }
    }
}

impl<S, D> SupervisorBuilder<S, D, Missing> {
    pub fn with_touch(self, touch: impl TouchSensor + 'static) -> SupervisorBuilder<S, D, Set> {
        SupervisorBuilder {
            left_light: self.left_light,
            right_light: self.right_light,
            left_motor: self.left_motor,
            right_motor: self.right_motor,
            touch: Some(Box::new(touch)),
            display: self.display,
            clock: self.clock,
            profiles: self.profiles,
            tick_ms: self.tick_ms,
            settle_ms: self.settle_ms,
            pivot_ticks: self.pivot_ticks,
            _s: PhantomData,
            _d: PhantomData,
            _t: PhantomData,
        }
    }
}

impl SupervisorBuilder<Set, Set, Set> {
    /// Validate and build the Supervisor. Only available when light sensors,
    /// drive, and touch are set.
    pub fn build(self) -> Result<Supervisor> {
        self.try_build()
    }
}
