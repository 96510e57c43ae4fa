pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::time::Duration;

/// Calibrated reflected-light sensor for one side of the chassis.
pub trait LightSensor {
    fn brightness(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;
}

/// One wheel of the differential drive. Duty is a signed PWM percentage
/// in [-100, 100]; each command fully replaces the previous one.
pub trait DriveMotor {
    fn set_pwm(&mut self, duty: i8) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Bump sensor polled by the waypoint-stop state.
pub trait TouchSensor {
    fn is_pressed(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// Wheel encoder pair sampled by the background telemetry sampler.
pub trait Odometer {
    /// Current (left, right) encoder counts.
    fn counts(&mut self) -> Result<(i16, i16), Box<dyn std::error::Error + Send + Sync>>;
}

/// Byte-duplex transport serving the telemetry download protocol.
pub trait Transport {
    /// Wait up to `timeout` for an inbound frame and copy it into `buf`.
    /// Returns the number of bytes received; `Ok(0)` means no frame arrived
    /// within the timeout and the caller should re-poll.
    fn recv(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, Box<dyn std::error::Error + Send + Sync>>;

    fn send(&mut self, frame: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Display collaborator notified on every supervisory state transition.
/// Infallible: a display that cannot render simply drops the label.
pub trait StatusDisplay {
    fn announce(&mut self, label: &str);
}
