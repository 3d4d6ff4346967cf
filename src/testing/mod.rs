//! Synthetic frames and frame-source doubles for offline testing.
//!
//! The scanner's decision path is exercised without any camera or GPIO
//! hardware: generated frames with known channel statistics drive the
//! classifier, and the stub sources stand in for the acquisition seam.

use crate::capture::FrameSource;
use crate::classifier;
use crate::errors::ScannerError;
use crate::types::Frame;

/// A frame filled with one RGB color.
pub fn uniform_frame(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for _ in 0..width * height {
        data.extend_from_slice(&rgb);
    }
    Frame::new(data, width, height, "synthetic".to_string())
}

/// A frame with one color in the classifier's central region of interest
/// and another everywhere else, for proving the ROI crop.
pub fn framed_roi(width: u32, height: u32, border_rgb: [u8; 3], roi_rgb: [u8; 3]) -> Frame {
    let mut frame = uniform_frame(width, height, border_rgb);
    let (x0, y0, side) = classifier::roi_bounds(width, height);
    for y in y0..(y0 + side).min(height) {
        for x in x0..(x0 + side).min(width) {
            let idx = ((y * width + x) * 3) as usize;
            frame.data[idx..idx + 3].copy_from_slice(&roi_rgb);
        }
    }
    frame
}

/// Frame source that always yields clones of one canned frame.
pub struct StaticSource {
    frame: Frame,
}

impl StaticSource {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }
}

impl FrameSource for StaticSource {
    fn acquire(&mut self) -> Result<Frame, ScannerError> {
        Ok(self.frame.clone())
    }
}

/// Frame source where both acquisition paths have failed.
pub struct FailingSource;

impl FrameSource for FailingSource {
    fn acquire(&mut self) -> Result<Frame, ScannerError> {
        Err(ScannerError::Acquisition(
            "both acquisition paths failed (synthetic)".to_string(),
        ))
    }
}

/// Frame source that alternates between a canned frame and failure,
/// starting with the frame.
pub struct FlakySource {
    frame: Frame,
    calls: usize,
}

impl FlakySource {
    pub fn new(frame: Frame) -> Self {
        Self { frame, calls: 0 }
    }
}

impl FrameSource for FlakySource {
    fn acquire(&mut self) -> Result<Frame, ScannerError> {
        self.calls += 1;
        if self.calls % 2 == 1 {
            Ok(self.frame.clone())
        } else {
            Err(ScannerError::Acquisition(
                "synthetic intermittent failure".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_frame_shape_and_content() {
        let frame = uniform_frame(32, 24, [1, 2, 3]);
        assert!(frame.is_valid_shape());
        assert_eq!(frame.pixel(0, 0), [1, 2, 3]);
        assert_eq!(frame.pixel(31, 23), [1, 2, 3]);
    }

    #[test]
    fn test_framed_roi_differs_from_border() {
        let frame = framed_roi(64, 64, [0, 0, 0], [255, 255, 255]);
        assert_eq!(frame.pixel(0, 0), [0, 0, 0]);
        assert_eq!(frame.pixel(32, 32), [255, 255, 255]);
    }

    #[test]
    fn test_flaky_source_alternates() {
        let mut source = FlakySource::new(uniform_frame(8, 8, [9, 9, 9]));
        assert!(source.acquire().is_ok());
        assert!(source.acquire().is_err());
        assert!(source.acquire().is_ok());
    }
}
