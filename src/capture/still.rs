//! Fallback capture path: an external single-shot still utility.
//!
//! When the continuous-capture device is unavailable, a configurable
//! command line (libcamera-still, fswebcam, ...) is invoked to write an
//! image file, which is then decoded. The binding mechanism is deliberately
//! a subprocess so any capture utility present on the rig can serve.

use crate::config::FallbackConfig;
use crate::errors::ScannerError;
use crate::types::Frame;
use std::path::PathBuf;
use std::process::Command;

pub struct StillCapture {
    command: Vec<String>,
    output: PathBuf,
}

impl StillCapture {
    pub fn new(config: &FallbackConfig) -> Self {
        Self {
            command: config.command.clone(),
            output: PathBuf::from(&config.output_file),
        }
    }

    /// Run the still-capture utility and decode the image it produced.
    pub fn capture(&self) -> Result<Frame, ScannerError> {
        if self.command.is_empty() {
            return Err(ScannerError::Acquisition(
                "no fallback capture command configured".to_string(),
            ));
        }

        let output_str = self.output.to_string_lossy();
        let argv: Vec<String> = self
            .command
            .iter()
            .map(|arg| arg.replace("{output}", &output_str))
            .collect();

        log::debug!("Running fallback capture: {:?}", argv);
        let status = Command::new(&argv[0])
            .args(&argv[1..])
            .status()
            .map_err(|e| {
                ScannerError::Acquisition(format!("fallback `{}` failed to start: {}", argv[0], e))
            })?;

        if !status.success() {
            return Err(ScannerError::Acquisition(format!(
                "fallback `{}` exited with {}",
                argv[0], status
            )));
        }

        let img = image::open(&self.output)
            .map_err(|e| {
                ScannerError::Acquisition(format!(
                    "could not decode fallback image {:?}: {}",
                    self.output, e
                ))
            })?
            .to_rgb8();

        let (width, height) = img.dimensions();
        let frame = Frame::new(img.into_raw(), width, height, "still".to_string());

        if !frame.is_valid_shape() {
            return Err(ScannerError::Acquisition(
                "fallback utility produced an empty image".to_string(),
            ));
        }

        log::info!("Fallback still capture succeeded ({}x{})", width, height);
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FallbackConfig;

    #[test]
    fn test_empty_command_is_rejected() {
        let capture = StillCapture::new(&FallbackConfig {
            command: Vec::new(),
            output_file: "unused.jpg".to_string(),
        });
        let err = capture.capture().unwrap_err();
        assert!(matches!(err, ScannerError::Acquisition(_)));
    }

    #[test]
    fn test_missing_utility_is_reported() {
        let capture = StillCapture::new(&FallbackConfig {
            command: vec![
                "definitely-not-a-real-capture-tool".to_string(),
                "-o".to_string(),
                "{output}".to_string(),
            ],
            output_file: "unused.jpg".to_string(),
        });
        let err = capture.capture().unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }

    #[test]
    fn test_decodes_image_written_by_command() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("canned.png");
        let out = dir.path().join("captured.png");
        image::RgbImage::from_pixel(8, 8, image::Rgb([10, 20, 30]))
            .save(&src)
            .unwrap();

        // Stand in for the capture utility with a plain copy.
        let capture = StillCapture::new(&FallbackConfig {
            command: vec![
                "cp".to_string(),
                src.to_string_lossy().into_owned(),
                "{output}".to_string(),
            ],
            output_file: out.to_string_lossy().into_owned(),
        });

        let frame = capture.capture().unwrap();
        assert_eq!((frame.width, frame.height), (8, 8));
        assert_eq!(frame.pixel(0, 0), [10, 20, 30]);
    }
}
