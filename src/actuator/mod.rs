//! LED and gate-servo actuation.
//!
//! The controller owns the NEUTRAL -> ACTIVE(decision) -> NEUTRAL sequence
//! for each scan. Pin-level output goes through the [`ActuatorBackend`]
//! seam: [`gpio::GpioBackend`] is generic over `embedded-hal` traits so any
//! platform GPIO/PWM implementation plugs in, and [`sim`] provides a
//! logging backend for hosts without hardware and for tests.

pub mod gpio;
pub mod sim;

pub use gpio::GpioBackend;
pub use sim::{simulated_backend, ActuatorEvent, EventLog};

use crate::config::ActuatorPins;
use crate::errors::ScannerError;
use crate::types::Decision;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Logical indicator LED state: at most one decision LED is lit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    Green,
    Red,
    Off,
}

/// Gate angles in degrees for each verdict plus the resting position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GateAngles {
    pub good: f64,
    pub bad: f64,
    pub center: f64,
}

impl GateAngles {
    fn for_decision(&self, decision: Decision) -> f64 {
        match decision {
            Decision::Good => self.good,
            Decision::Bad => self.bad,
        }
    }
}

/// Logical actuator state. Only the physical motion/light persists; this is
/// transient bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorState {
    Neutral,
    Active(Decision),
}

/// Pin-level output seam. Implementations map logical LED/gate commands to
/// concrete hardware (or to a simulation log).
pub trait ActuatorBackend {
    fn set_led(&mut self, led: LedState) -> Result<(), ScannerError>;

    /// Start driving the servo signal for the given angle.
    fn drive_gate(&mut self, angle: f64) -> Result<(), ScannerError>;

    /// Withdraw the servo signal to avoid jitter and holding current.
    fn release_gate(&mut self) -> Result<(), ScannerError>;

    /// Short label for logs ("gpio", "simulated").
    fn describe(&self) -> &'static str;
}

/// Drives LEDs and the gate servo through the per-scan sequence.
pub struct ActuatorController {
    backend: Box<dyn ActuatorBackend + Send>,
    pins: ActuatorPins,
    angles: GateAngles,
    settle: Duration,
    state: ActuatorState,
    initialized: bool,
}

impl ActuatorController {
    pub fn new(
        backend: Box<dyn ActuatorBackend + Send>,
        pins: ActuatorPins,
        angles: GateAngles,
        settle: Duration,
    ) -> Self {
        Self {
            backend,
            pins,
            angles,
            settle,
            state: ActuatorState::Neutral,
            initialized: false,
        }
    }

    /// Controller backed by the in-memory simulation. Used on hosts without
    /// wired GPIO and as the degraded mode after hardware init failure.
    pub fn simulated(pins: ActuatorPins, angles: GateAngles, settle: Duration) -> Self {
        let (backend, _log) = simulated_backend(&pins);
        Self::new(Box::new(backend), pins, angles, settle)
    }

    /// Bring the outputs to the neutral state. Idempotent: repeated calls
    /// are no-ops. A failing backend is swapped for the simulation so
    /// classification and counting keep working.
    pub fn init(&mut self) -> Result<(), ScannerError> {
        if self.initialized {
            return Ok(());
        }

        log::info!(
            "Initializing actuator ({} backend, LEDs {}/{}, servo {} @ {} Hz)",
            self.backend.describe(),
            self.pins.green_led,
            self.pins.red_led,
            self.pins.servo,
            self.pins.pwm_frequency_hz
        );

        if let Err(e) = self.drive_neutral() {
            log::warn!(
                "Actuator hardware unavailable ({}); continuing in simulate-only mode",
                e
            );
            let (backend, _log) = simulated_backend(&self.pins);
            self.backend = Box::new(backend);
            self.drive_neutral()?;
        }

        self.state = ActuatorState::Neutral;
        self.initialized = true;
        Ok(())
    }

    /// Drive the outputs for a decision: one LED on, gate at the
    /// decision-specific angle. The caller owns the dwell and the following
    /// [`reset`](Self::reset).
    pub fn actuate(&mut self, decision: Decision) -> Result<(), ScannerError> {
        self.init()?;

        let led = match decision {
            Decision::Good => LedState::Green,
            Decision::Bad => LedState::Red,
        };
        let angle = self.angles.for_decision(decision);
        log::debug!("Actuating {}: LED {:?}, gate {}°", decision, led, angle);

        self.backend.set_led(led)?;
        self.move_gate(angle)?;
        self.state = ActuatorState::Active(decision);
        Ok(())
    }

    /// Return to neutral: LEDs off, gate centered. Safe to call at any
    /// time, including after a partial init or mid-sequence failure.
    pub fn reset(&mut self) -> Result<(), ScannerError> {
        self.drive_neutral()?;
        self.state = ActuatorState::Neutral;
        Ok(())
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    fn drive_neutral(&mut self) -> Result<(), ScannerError> {
        self.backend.set_led(LedState::Off)?;
        self.move_gate(self.angles.center)
    }

    /// Command an angle, hold the signal for the settle duration, then
    /// withdraw it.
    fn move_gate(&mut self, angle: f64) -> Result<(), ScannerError> {
        self.backend.drive_gate(angle)?;
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
        self.backend.release_gate()
    }
}
