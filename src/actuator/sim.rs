//! In-memory actuator simulation.
//!
//! Implements the `embedded-hal` pin traits against a shared event log,
//! enabling offline development on hosts without wired GPIO and exact
//! sequence assertions in tests. Also the degraded "simulate-only" mode
//! when actuator hardware is absent.

use crate::actuator::gpio::GpioBackend;
use crate::config::ActuatorPins;
use core::convert::Infallible;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use std::sync::{Arc, Mutex};

/// One observed pin-level action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorEvent {
    PinHigh(u8),
    PinLow(u8),
    Duty { pin: u8, duty: u16 },
}

/// Shared, ordered record of every simulated pin action.
pub type EventLog = Arc<Mutex<Vec<ActuatorEvent>>>;

/// Simulated digital output.
pub struct SimulatedPin {
    pin: u8,
    log: EventLog,
}

impl SimulatedPin {
    pub fn new(pin: u8, log: EventLog) -> Self {
        Self { pin, log }
    }

    fn record(&self, event: ActuatorEvent) {
        if let Ok(mut log) = self.log.lock() {
            log.push(event);
        }
    }
}

impl embedded_hal::digital::ErrorType for SimulatedPin {
    type Error = Infallible;
}

impl OutputPin for SimulatedPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        log::trace!("[sim] GPIO{} -> LOW", self.pin);
        self.record(ActuatorEvent::PinLow(self.pin));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        log::trace!("[sim] GPIO{} -> HIGH", self.pin);
        self.record(ActuatorEvent::PinHigh(self.pin));
        Ok(())
    }
}

/// Simulated PWM channel. One duty tick corresponds to 1 µs of a 50 Hz
/// period, so `max_duty_cycle` is the full 20 ms frame.
pub struct SimulatedPwm {
    pin: u8,
    log: EventLog,
}

impl SimulatedPwm {
    pub const MAX_DUTY: u16 = 20_000;

    pub fn new(pin: u8, log: EventLog) -> Self {
        Self { pin, log }
    }
}

impl embedded_hal::pwm::ErrorType for SimulatedPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SimulatedPwm {
    fn max_duty_cycle(&self) -> u16 {
        Self::MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        log::trace!("[sim] PWM{} duty -> {}/{}", self.pin, duty, Self::MAX_DUTY);
        if let Ok(mut log) = self.log.lock() {
            log.push(ActuatorEvent::Duty {
                pin: self.pin,
                duty,
            });
        }
        Ok(())
    }
}

/// Build a simulated GPIO backend wired to the configured pin numbers,
/// returning the shared event log alongside it.
pub fn simulated_backend(
    pins: &ActuatorPins,
) -> (
    GpioBackend<SimulatedPin, SimulatedPin, SimulatedPwm>,
    EventLog,
) {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let backend = GpioBackend::with_label(
        SimulatedPin::new(pins.green_led, log.clone()),
        SimulatedPin::new(pins.red_led, log.clone()),
        SimulatedPwm::new(pins.servo, log.clone()),
        "simulated",
    );
    (backend, log)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_pin_records_events() {
        let log: EventLog = Arc::new(Mutex::new(Vec::new()));
        let mut pin = SimulatedPin::new(17, log.clone());
        pin.set_high().unwrap();
        pin.set_low().unwrap();
        assert_eq!(
            log.lock().unwrap().clone(),
            vec![ActuatorEvent::PinHigh(17), ActuatorEvent::PinLow(17)]
        );
    }

    #[test]
    fn test_simulated_pwm_full_period() {
        let log: EventLog = Arc::new(Mutex::new(Vec::new()));
        let mut pwm = SimulatedPwm::new(18, log.clone());
        assert_eq!(pwm.max_duty_cycle(), 20_000);
        pwm.set_duty_cycle(1500).unwrap();
        assert_eq!(
            log.lock().unwrap().clone(),
            vec![ActuatorEvent::Duty {
                pin: 18,
                duty: 1500
            }]
        );
    }
}
