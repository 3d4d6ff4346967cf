//! Primary capture path: a continuous-capture camera device.
//!
//! The nokhwa callback camera feeds frames into a bounded channel;
//! `capture` drains whatever is stale and waits for a fresh frame with a
//! timeout, so a wedged driver cannot block a scan indefinitely.

use crate::config::CameraConfig;
use crate::errors::ScannerError;
use crate::types::Frame;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::{Buffer, CallbackCamera};
use std::sync::mpsc::{sync_channel, Receiver};
use std::time::Duration;

/// Open camera device plus the channel its callback feeds.
pub struct DeviceCamera {
    camera: CallbackCamera,
    frames: Receiver<Buffer>,
    device_index: u32,
    timeout: Duration,
}

impl DeviceCamera {
    /// Open the configured device, probing neighboring indices when the
    /// preferred one does not come up (USB cameras occasionally enumerate
    /// at a different index after a reboot).
    pub fn open(config: &CameraConfig) -> Result<Self, ScannerError> {
        let mut indices = vec![config.device_index];
        for candidate in [0u32, 1] {
            if !indices.contains(&candidate) {
                indices.push(candidate);
            }
        }

        let mut last_error = None;
        for index in indices {
            match Self::open_index(index, config) {
                Ok(device) => {
                    log::info!("Camera {} ready", index);
                    return Ok(device);
                }
                Err(e) => {
                    log::warn!("Camera {} unavailable: {}", index, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ScannerError::HardwareInit("no camera device configured".to_string())
        }))
    }

    fn open_index(index: u32, config: &CameraConfig) -> Result<Self, ScannerError> {
        let (tx, rx) = sync_channel::<Buffer>(1);

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(config.resolution[0], config.resolution[1]),
                FrameFormat::MJPEG,
                30,
            ),
        ));

        let mut camera = CallbackCamera::new(CameraIndex::Index(index), requested, move |buffer| {
            // Keep only the freshest frame; drop when the consumer lags.
            let _ = tx.try_send(buffer);
        })
        .map_err(|e| ScannerError::HardwareInit(format!("open camera {}: {}", index, e)))?;

        camera
            .open_stream()
            .map_err(|e| ScannerError::HardwareInit(format!("start stream {}: {}", index, e)))?;

        let mut device = Self {
            camera,
            frames: rx,
            device_index: index,
            timeout: Duration::from_millis(config.capture_timeout_ms),
        };

        // Validate that the device actually produces decodable frames
        // before declaring it usable. Allow extra time for warmup.
        let probe_timeout = device.timeout * 2;
        let probe = device
            .capture_within(probe_timeout)
            .map_err(|e| ScannerError::HardwareInit(format!("camera {} probe: {}", index, e)))?;
        log::debug!(
            "Camera {} probe frame {}x{}",
            index,
            probe.width,
            probe.height
        );

        Ok(device)
    }

    /// Capture one fresh frame within the configured timeout.
    pub fn capture(&mut self) -> Result<Frame, ScannerError> {
        self.capture_within(self.timeout)
    }

    fn capture_within(&mut self, timeout: Duration) -> Result<Frame, ScannerError> {
        // Discard whatever was buffered before the trigger.
        while self.frames.try_recv().is_ok() {}

        let buffer = self.frames.recv_timeout(timeout).map_err(|_| {
            ScannerError::Acquisition(format!(
                "no frame from camera {} within {:?}",
                self.device_index, timeout
            ))
        })?;

        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| ScannerError::Acquisition(format!("frame decode failed: {}", e)))?;

        let (width, height) = decoded.dimensions();
        let frame = Frame::new(
            decoded.into_raw(),
            width,
            height,
            format!("camera{}", self.device_index),
        );

        if !frame.is_valid_shape() {
            return Err(ScannerError::Acquisition(format!(
                "camera {} produced a malformed frame",
                self.device_index
            )));
        }

        Ok(frame)
    }

    pub fn device_index(&self) -> u32 {
        self.device_index
    }
}

impl Drop for DeviceCamera {
    fn drop(&mut self) {
        let _ = self.camera.stop_stream();
    }
}

// The callback camera is only ever driven behind &mut self; the capture
// channel endpoints are Send.
unsafe impl Send for DeviceCamera {}
