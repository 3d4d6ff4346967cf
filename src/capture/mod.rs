//! Frame acquisition.
//!
//! Two paths sit behind the [`FrameSource`] seam: a continuous-capture
//! camera device ([`device::DeviceCamera`]) and a single-shot external
//! still-capture utility ([`still::StillCapture`]). [`CameraSource`] tries
//! the primary path first and falls back to the still path, so a flaky
//! camera degrades to slower scans instead of failed ones.

pub mod device;
pub mod still;

pub use device::DeviceCamera;
pub use still::StillCapture;

use crate::config::{CameraConfig, FallbackConfig};
use crate::errors::ScannerError;
use crate::types::Frame;

/// Acquire one validated image. Failure is non-fatal to the caller: the
/// scan loop treats it as "no decision, no actuation, retry on the next
/// trigger".
pub trait FrameSource {
    fn acquire(&mut self) -> Result<Frame, ScannerError>;
}

/// Production frame source: camera device with still-capture fallback.
///
/// Device initialization is lazy and idempotent. When eager startup init
/// failed (or the device later disappears) the next `acquire` retries it
/// before resorting to the fallback.
pub struct CameraSource {
    config: CameraConfig,
    fallback: StillCapture,
    device: Option<DeviceCamera>,
}

impl CameraSource {
    pub fn new(camera: &CameraConfig, fallback: &FallbackConfig) -> Self {
        Self {
            config: camera.clone(),
            fallback: StillCapture::new(fallback),
            device: None,
        }
    }

    /// Open the camera device if it is not already open. Idempotent.
    fn ensure_device(&mut self) -> Result<&mut DeviceCamera, ScannerError> {
        if self.device.is_none() {
            let device = DeviceCamera::open(&self.config)?;
            self.device = Some(device);
        }
        // The Option was just filled on the None path.
        self.device
            .as_mut()
            .ok_or_else(|| ScannerError::HardwareInit("camera handle missing".to_string()))
    }

    fn acquire_primary(&mut self) -> Result<Frame, ScannerError> {
        let device = self.ensure_device()?;
        match device.capture() {
            Ok(frame) => Ok(frame),
            Err(e) => {
                // Drop the handle so the next acquire re-opens the device.
                log::warn!("Primary capture failed ({}), releasing camera", e);
                self.device = None;
                Err(e)
            }
        }
    }
}

impl FrameSource for CameraSource {
    fn acquire(&mut self) -> Result<Frame, ScannerError> {
        let primary_err = match self.acquire_primary() {
            Ok(frame) => return Ok(frame),
            Err(e) => e,
        };

        log::warn!(
            "Primary acquisition failed ({}), trying still-capture fallback",
            primary_err
        );
        match self.fallback.capture() {
            Ok(frame) => Ok(frame),
            Err(fallback_err) => Err(ScannerError::Acquisition(format!(
                "both acquisition paths failed (primary: {}; fallback: {})",
                primary_err, fallback_err
            ))),
        }
    }
}
