#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Line-following control logic (hardware-agnostic).
//!
//! This crate provides the hardware-independent robot controller. All
//! hardware interactions go through the `linebot_traits` traits.
//!
//! ## Architecture
//!
//! - **Classification**: windowed brightness averaging into White/Gray/Black
//!   (`classify` module)
//! - **Steering**: bang-bang differential drive decisions per motion profile
//!   (`motion` module)
//! - **State machines**: follow and find-line sub-machines plus the top-level
//!   supervisory cycle (`fsm`, `supervisor` modules)
//! - **Telemetry**: background odometry sampling into a fixed ring and a
//!   request/response download protocol (`buffer`, `sampler`, `telemetry`)

pub mod buffer;
pub mod classify;
pub mod error;
pub mod fsm;
pub mod hw_error;
pub mod mocks;
pub mod motion;
pub mod runner;
pub mod sampler;
pub mod supervisor;
pub mod telemetry;
pub mod util;

pub use buffer::{RECORD_BYTES, Sample, SampleRing, SharedSampleBuffer};
pub use classify::{BrightnessClassifier, SensorClass, Thresholds};
pub use error::{BuildError, Result, RobotError};
pub use fsm::{FindLineState, FollowState, SegmentOutcome, SupervisorState};
pub use motion::{DriveCommand, LinePredicate, LossCondition, MotionProfile, Steer, steer};
pub use runner::run_session;
pub use sampler::MotionSampler;
pub use supervisor::{ProfileSet, Supervisor, SupervisorBuilder, TraceDisplay};
pub use telemetry::{SessionControl, TelemetryServer, handle_request};
