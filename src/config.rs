//! Configuration management for FiberTrace.
//!
//! Provides configuration loading, saving, and validation for camera
//! selection, classifier tuning, hardware pin assignment, actuation timing,
//! and storage paths.

use crate::actuator::GateAngles;
use crate::errors::ScannerError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiberTraceConfig {
    pub camera: CameraConfig,
    pub fallback: FallbackConfig,
    pub classifier: ClassifierConfig,
    pub actuator: ActuatorConfig,
    pub scan: ScanConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

/// Primary capture path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Preferred device index. Other low indices are probed when it fails.
    pub device_index: u32,
    /// Requested capture resolution [width, height].
    pub resolution: [u32; 2],
    /// How long to wait for a frame from the continuous-capture device.
    pub capture_timeout_ms: u64,
}

/// Secondary single-shot capture path, invoked as an external process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Still-capture command line; `{output}` is replaced with `output_file`.
    /// Empty disables the fallback path.
    pub command: Vec<String>,
    /// Where the external utility writes its image.
    pub output_file: String,
}

/// Classifier tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Intensity margin by which blue must exceed both red and green for a
    /// BAD verdict. No calibration rationale; inherited from the rig.
    pub color_margin: f64,
}

/// Fixed hardware pin assignment (BCM numbering).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActuatorPins {
    pub green_led: u8,
    pub red_led: u8,
    pub servo: u8,
    /// Servo pulse frequency. Standard rotary actuators expect 50 Hz.
    pub pwm_frequency_hz: u32,
}

/// LED and gate-servo configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuatorConfig {
    pub pins: ActuatorPins,
    pub angles: GateAngles,
    /// How long the servo signal is driven before being withdrawn.
    pub settle_ms: u64,
}

/// Scan sequencing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// How long the result (LED + gate position) is held before reset.
    pub dwell_ms: u64,
}

/// Storage and file management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Counters file shared with the dashboard reader.
    pub data_file: String,
    /// Optional preview snapshot of the last scanned frame.
    pub preview_file: Option<String>,
    /// JPEG quality (1-100) for previews and snapshots.
    pub jpeg_quality: u8,
}

/// Web front-end configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for FiberTraceConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                device_index: 0,
                resolution: [640, 480],
                capture_timeout_ms: 1000,
            },
            fallback: FallbackConfig {
                command: vec![
                    "libcamera-still".to_string(),
                    "-n".to_string(),
                    "--immediate".to_string(),
                    "-o".to_string(),
                    "{output}".to_string(),
                ],
                output_file: "fallback_capture.jpg".to_string(),
            },
            classifier: ClassifierConfig { color_margin: 20.0 },
            actuator: ActuatorConfig {
                pins: ActuatorPins {
                    green_led: 17,
                    red_led: 27,
                    servo: 18,
                    pwm_frequency_hz: 50,
                },
                angles: GateAngles {
                    good: 40.0,
                    bad: 140.0,
                    center: 90.0,
                },
                settle_ms: 400,
            },
            scan: ScanConfig { dwell_ms: 1000 },
            storage: StorageConfig {
                data_file: "fibertrace_data.json".to_string(),
                preview_file: None,
                jpeg_quality: 85,
            },
            server: ServerConfig {
                bind_addr: "0.0.0.0:5000".to_string(),
            },
        }
    }
}

impl FiberTraceConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScannerError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScannerError::Config(format!("Failed to read config file: {}", e)))?;

        let config: FiberTraceConfig = toml::from_str(&contents)
            .map_err(|e| ScannerError::Config(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ScannerError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ScannerError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ScannerError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| ScannerError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        PathBuf::from("fibertrace.toml")
    }

    /// Load from the default location, falling back to defaults.
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.camera.resolution[0] == 0 || self.camera.resolution[1] == 0 {
            return Err("Invalid capture resolution".to_string());
        }
        if self.camera.capture_timeout_ms == 0 {
            return Err("Capture timeout must be non-zero".to_string());
        }

        if !(0.0..=255.0).contains(&self.classifier.color_margin) {
            return Err("Color margin must be between 0 and 255".to_string());
        }

        for (name, angle) in [
            ("good", self.actuator.angles.good),
            ("bad", self.actuator.angles.bad),
            ("center", self.actuator.angles.center),
        ] {
            if !(0.0..=180.0).contains(&angle) {
                return Err(format!("Gate angle '{}' must be between 0 and 180", name));
            }
        }
        if self.actuator.pins.pwm_frequency_hz == 0 {
            return Err("PWM frequency must be non-zero".to_string());
        }
        if self.actuator.settle_ms > 10_000 {
            return Err("Servo settle time must be at most 10s".to_string());
        }

        if self.scan.dwell_ms > 60_000 {
            return Err("Result dwell must be at most 60s".to_string());
        }

        if self.storage.data_file.is_empty() {
            return Err("Data file path must not be empty".to_string());
        }
        if self.storage.jpeg_quality == 0 || self.storage.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }

        if self.server.bind_addr.is_empty() {
            return Err("Server bind address must not be empty".to_string());
        }

        Ok(())
    }
}
