#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and brightness calibration parsing for the line follower.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The calibration CSV loader fits White/Black classification thresholds
//!   from labelled surface readings taken on the deployment surface.
use serde::Deserialize;

/// Signed PWM duty range accepted by the drive motors.
pub const PWM_LIMIT: i8 = 100;

/// Calibration CSV schema.
///
/// Expected headers:
/// surface,brightness
///
/// Example:
/// surface,brightness
/// line,312
/// floor,605
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SurfaceRow {
    pub surface: Surface,
    pub brightness: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    /// On the tape (dark).
    Line,
    /// Off the tape (bright).
    Floor,
}

/// Sensor/actuator port wiring; informational, but validated distinct.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Ports {
    pub left_light: u8,
    pub right_light: u8,
    pub touch: u8,
}

impl Default for Ports {
    fn default() -> Self {
        Self {
            left_light: 1,
            right_light: 3,
            touch: 4,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SupervisorCfg {
    /// Poll period of the top-level dispatcher (ms).
    pub tick_ms: u64,
    /// Delay before the Start state first classifies the surface (ms).
    pub settle_ms: u64,
}

impl Default for SupervisorCfg {
    fn default() -> Self {
        Self {
            tick_ms: 200,
            settle_ms: 500,
        }
    }
}

/// Which classifications count as "on the line" for a profile.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnLine {
    #[default]
    Black,
    NotWhite,
}

/// Which simultaneous pair of classifications signals line loss.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LostWhen {
    #[default]
    BothGray,
    BothWhite,
}

/// One motion profile: thresholds, speeds, predicates and timing for a
/// single operating mode (follow / find_line / waypoint / resume).
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ProfileCfg {
    /// Brightness above this classifies White.
    pub high: u16,
    /// Brightness below this classifies Black.
    pub low: u16,
    /// Readings averaged before classification.
    pub avg_window: usize,
    pub forward_pwm: i8,
    pub pivot_pwm: i8,
    pub on_line: OnLine,
    pub lost_when: LostWhen,
    /// Per-tick poll period (ms).
    pub tick_ms: u64,
    /// Wall-clock bound for timed segments (ms); None for unbounded profiles.
    pub deadline_ms: Option<u64>,
}

impl Default for ProfileCfg {
    fn default() -> Self {
        Self {
            high: 520,
            low: 450,
            avg_window: 5,
            forward_pwm: 60,
            pivot_pwm: 40,
            on_line: OnLine::Black,
            lost_when: LostWhen::BothGray,
            tick_ms: 200,
            deadline_ms: None,
        }
    }
}

/// The four operating-mode profiles. Calibrations differ per mode on the
/// reference robot (520/450 follow, 530/400 find-line, 550/450 waypoint).
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Profiles {
    pub follow: ProfileCfg,
    pub find_line: ProfileCfg,
    pub waypoint: ProfileCfg,
    pub resume: ProfileCfg,
}

impl Default for Profiles {
    fn default() -> Self {
        Self {
            follow: ProfileCfg::default(),
            find_line: ProfileCfg {
                high: 530,
                low: 400,
                forward_pwm: 50,
                ..ProfileCfg::default()
            },
            waypoint: ProfileCfg {
                high: 550,
                low: 450,
                deadline_ms: Some(1000),
                ..ProfileCfg::default()
            },
            resume: ProfileCfg {
                deadline_ms: Some(2000),
                ..ProfileCfg::default()
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct FindLineCfg {
    /// Ticks to pivot onto the line after both sensors acquire it.
    /// A fixed count substitutes for sensor confirmation.
    pub pivot_ticks: u32,
}

impl Default for FindLineCfg {
    fn default() -> Self {
        Self { pivot_ticks: 5 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct TelemetryCfg {
    /// Sample ring capacity (records).
    pub capacity: usize,
    /// Background sampler rate (Hz).
    pub sampler_hz: u32,
    /// Transport poll timeout per request (ms).
    pub recv_timeout_ms: u64,
}

impl Default for TelemetryCfg {
    fn default() -> Self {
        Self {
            capacity: 1000,
            sampler_hz: 5,
            recv_timeout_ms: 200,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub ports: Ports,
    pub supervisor: SupervisorCfg,
    #[serde(rename = "profile")]
    pub profiles: Profiles,
    pub find_line: FindLineCfg,
    pub telemetry: TelemetryCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl ProfileCfg {
    fn validate(&self, name: &str) -> eyre::Result<()> {
        if self.low >= self.high {
            eyre::bail!("profile {name}: low threshold must be below high");
        }
        if self.avg_window == 0 {
            eyre::bail!("profile {name}: avg_window must be >= 1");
        }
        if self.forward_pwm <= 0 || self.forward_pwm > PWM_LIMIT {
            eyre::bail!("profile {name}: forward_pwm must be in 1..={PWM_LIMIT}");
        }
        if self.pivot_pwm <= 0 || self.pivot_pwm > PWM_LIMIT {
            eyre::bail!("profile {name}: pivot_pwm must be in 1..={PWM_LIMIT}");
        }
        if self.tick_ms == 0 {
            eyre::bail!("profile {name}: tick_ms must be > 0");
        }
        if let Some(d) = self.deadline_ms
            && d == 0
        {
            eyre::bail!("profile {name}: deadline_ms must be > 0 when set");
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        self.profiles.follow.validate("follow")?;
        self.profiles.find_line.validate("find_line")?;
        self.profiles.waypoint.validate("waypoint")?;
        self.profiles.resume.validate("resume")?;
        if self.profiles.waypoint.deadline_ms.is_none() {
            eyre::bail!("profile waypoint: deadline_ms is required");
        }
        if self.profiles.resume.deadline_ms.is_none() {
            eyre::bail!("profile resume: deadline_ms is required");
        }
        if self.supervisor.tick_ms == 0 {
            eyre::bail!("supervisor.tick_ms must be > 0");
        }
        if self.find_line.pivot_ticks == 0 {
            eyre::bail!("find_line.pivot_ticks must be > 0");
        }
        if self.telemetry.capacity == 0 {
            eyre::bail!("telemetry.capacity must be > 0");
        }
        if self.telemetry.capacity > usize::from(u16::MAX) {
            eyre::bail!("telemetry.capacity must fit the 16-bit wire index");
        }
        if self.telemetry.sampler_hz == 0 {
            eyre::bail!("telemetry.sampler_hz must be > 0");
        }
        if self.telemetry.recv_timeout_ms == 0 {
            eyre::bail!("telemetry.recv_timeout_ms must be > 0");
        }
        let p = &self.ports;
        if p.left_light == p.right_light || p.left_light == p.touch || p.right_light == p.touch {
            eyre::bail!("ports must be distinct");
        }
        Ok(())
    }
}

/// Classification thresholds fitted from a labelled calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub high: u16,
    pub low: u16,
}

impl Thresholds {
    /// Fit thresholds from labelled surface readings.
    ///
    /// The darkest floor reading must sit strictly above the brightest line
    /// reading; the thresholds are placed at thirds of the separation gap so
    /// the middle third classifies Gray.
    pub fn from_rows(rows: &[SurfaceRow]) -> eyre::Result<Self> {
        let mut max_line: Option<u16> = None;
        let mut min_floor: Option<u16> = None;
        for row in rows {
            match row.surface {
                Surface::Line => {
                    max_line = Some(max_line.map_or(row.brightness, |m| m.max(row.brightness)));
                }
                Surface::Floor => {
                    min_floor = Some(min_floor.map_or(row.brightness, |m| m.min(row.brightness)));
                }
            }
        }
        let Some(max_line) = max_line else {
            eyre::bail!("calibration requires at least one 'line' row");
        };
        let Some(min_floor) = min_floor else {
            eyre::bail!("calibration requires at least one 'floor' row");
        };
        if min_floor <= max_line {
            eyre::bail!(
                "calibration surfaces overlap: brightest line {max_line} >= darkest floor {min_floor}"
            );
        }
        let gap = min_floor - max_line;
        if gap < 3 {
            eyre::bail!("calibration separation too small ({gap}); re-run on the real surface");
        }
        Ok(Self {
            low: max_line + gap / 3,
            high: min_floor - gap / 3,
        })
    }
}

/// Read labelled surface rows from a calibration CSV (headers required).
pub fn read_surface_csv(path: &std::path::Path) -> eyre::Result<Vec<SurfaceRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("opening calibration csv: {e}"))?;
    let mut rows = Vec::new();
    for rec in rdr.deserialize::<SurfaceRow>() {
        rows.push(rec.map_err(|e| eyre::eyre!("parsing calibration csv: {e}"))?);
    }
    if rows.is_empty() {
        eyre::bail!("calibration csv contains no rows");
    }
    Ok(rows)
}
