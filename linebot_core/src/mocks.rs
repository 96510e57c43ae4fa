//! Test and helper mocks for linebot_core

/// A light sensor that returns the same reading forever.
pub struct SteadyLight(pub u16);

impl linebot_traits::LightSensor for SteadyLight {
    fn brightness(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0)
    }
}

/// A motor that accepts every command and records nothing.
pub struct NullMotor;

impl linebot_traits::DriveMotor for NullMotor {
    fn set_pwm(&mut self, _duty: i8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// A touch sensor that is never pressed.
pub struct NeverPressed;

impl linebot_traits::TouchSensor for NeverPressed {
    fn is_pressed(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(false)
    }
}
