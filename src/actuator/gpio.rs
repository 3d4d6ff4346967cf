//! Pin-level actuator backend over `embedded-hal` traits.
//!
//! Generic over two digital LED outputs and one PWM servo channel, so any
//! platform implementation of `OutputPin`/`SetDutyCycle` (rppal, linux-
//! embedded-hal, ...) can be wired in without touching the controller.

use crate::actuator::{ActuatorBackend, LedState};
use crate::errors::ScannerError;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

/// Duty cycle at 0° for a standard 50 Hz rotary actuator, in percent.
pub const GATE_DUTY_BASE_PERCENT: f64 = 2.5;

/// Degrees per duty-cycle percent: 180° spans 2.5%..12.5%.
pub const GATE_DUTY_SCALE: f64 = 18.0;

/// Linear angle-to-signal mapping: 0° -> 2.5%, 90° -> 7.5%, 180° -> 12.5%.
pub fn duty_percent(angle: f64) -> f64 {
    GATE_DUTY_BASE_PERCENT + angle / GATE_DUTY_SCALE
}

/// GPIO/PWM actuator backend.
pub struct GpioBackend<G, R, P> {
    green: G,
    red: R,
    servo: P,
    label: &'static str,
}

impl<G, R, P> GpioBackend<G, R, P>
where
    G: OutputPin,
    R: OutputPin,
    P: SetDutyCycle,
{
    pub fn new(green: G, red: R, servo: P) -> Self {
        Self {
            green,
            red,
            servo,
            label: "gpio",
        }
    }

    pub(crate) fn with_label(green: G, red: R, servo: P, label: &'static str) -> Self {
        Self {
            green,
            red,
            servo,
            label,
        }
    }
}

impl<G, R, P> ActuatorBackend for GpioBackend<G, R, P>
where
    G: OutputPin,
    R: OutputPin,
    P: SetDutyCycle,
{
    fn set_led(&mut self, led: LedState) -> Result<(), ScannerError> {
        let (green_high, red_high) = match led {
            LedState::Green => (true, false),
            LedState::Red => (false, true),
            LedState::Off => (false, false),
        };

        let green_result = if green_high {
            self.green.set_high()
        } else {
            self.green.set_low()
        };
        green_result
            .map_err(|e| ScannerError::Actuation(format!("green LED pin write: {:?}", e)))?;

        let red_result = if red_high {
            self.red.set_high()
        } else {
            self.red.set_low()
        };
        red_result.map_err(|e| ScannerError::Actuation(format!("red LED pin write: {:?}", e)))
    }

    fn drive_gate(&mut self, angle: f64) -> Result<(), ScannerError> {
        let max = f64::from(self.servo.max_duty_cycle());
        let duty = (duty_percent(angle) / 100.0 * max).round() as u16;
        self.servo
            .set_duty_cycle(duty)
            .map_err(|e| ScannerError::Actuation(format!("servo duty write: {:?}", e)))
    }

    fn release_gate(&mut self) -> Result<(), ScannerError> {
        self.servo
            .set_duty_cycle(0)
            .map_err(|e| ScannerError::Actuation(format!("servo release: {:?}", e)))
    }

    fn describe(&self) -> &'static str {
        self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duty_mapping_endpoints() {
        assert!((duty_percent(0.0) - 2.5).abs() < 1e-9);
        assert!((duty_percent(90.0) - 7.5).abs() < 1e-9);
        assert!((duty_percent(180.0) - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_duty_mapping_gate_angles() {
        // The demo rig's gate angles.
        assert!((duty_percent(40.0) - 4.722).abs() < 1e-3);
        assert!((duty_percent(140.0) - 10.278).abs() < 1e-3);
    }
}
