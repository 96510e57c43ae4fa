use thiserror::Error;

/// Typed hardware-level faults surfaced by the simulated (and any future
/// real) sensor/actuator implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HwError {
    #[error("timed out waiting for sensor data")]
    Timeout,
    #[error("transport disconnected")]
    Disconnected,
    #[error("device fault: {0}")]
    Device(String),
}
