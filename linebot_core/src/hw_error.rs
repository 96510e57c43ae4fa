//! Maps `Box<dyn Error>` from trait boundaries to typed `RobotError`.
//!
//! The traits in `linebot_traits` use `Box<dyn Error + Send + Sync>` for
//! maximum flexibility; this module converts those to our typed error enum,
//! with an optional feature-gated path for `linebot_hardware::HwError`
//! downcasting.

use crate::error::RobotError;

/// Map a trait-boundary error to a typed `RobotError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> RobotError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<linebot_hardware::error::HwError>() {
            return match hw {
                linebot_hardware::error::HwError::Timeout => RobotError::Timeout,
                other => RobotError::HardwareFault(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        RobotError::Timeout
    } else {
        RobotError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Plain(&'static str);
    impl std::fmt::Display for Plain {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }
    impl std::error::Error for Plain {}

    #[test]
    fn string_timeout_maps_to_timeout() {
        assert!(matches!(
            map_hw_error(&Plain("sensor Timeout after 200ms")),
            RobotError::Timeout
        ));
    }

    #[test]
    fn other_strings_map_to_hardware() {
        assert!(matches!(
            map_hw_error(&Plain("i2c bus stuck")),
            RobotError::Hardware(_)
        ));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_error_downcast_is_precise() {
        use linebot_hardware::error::HwError;
        assert!(matches!(map_hw_error(&HwError::Timeout), RobotError::Timeout));
        assert!(matches!(
            map_hw_error(&HwError::Disconnected),
            RobotError::HardwareFault(_)
        ));
    }
}
