//! Core data types shared across the scanner.

use crate::errors::ScannerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single captured image: an RGB8 pixel grid plus capture metadata.
///
/// Frames are ephemeral. They are owned by the call that produced them and
/// are not retained across scans, except as an optional preview snapshot
/// written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub id: Uuid,
    /// Interleaved RGB8 pixel data, row-major, `width * height * 3` bytes.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: DateTime<Utc>,
    /// Which acquisition path produced this frame (e.g. "camera0", "still").
    pub source: String,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, source: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
            width,
            height,
            timestamp: Utc::now(),
            source,
        }
    }

    /// A frame is well-formed when it is non-empty and the buffer length
    /// matches its stated dimensions. Both acquisition paths check this
    /// before handing a frame to the caller.
    pub fn is_valid_shape(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width as usize) * (self.height as usize) * 3
    }

    /// Pixel at (x, y) as `[r, g, b]`. Callers must stay in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y * self.width + x) * 3) as usize;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Encode the frame as JPEG for the preview interface.
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, ScannerError> {
        let img = image::RgbImage::from_vec(self.width, self.height, self.data.clone())
            .ok_or_else(|| {
                ScannerError::Acquisition("frame data does not match its dimensions".to_string())
            })?;

        let mut out = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
        image::DynamicImage::ImageRgb8(img)
            .write_with_encoder(encoder)
            .map_err(|e| ScannerError::Acquisition(format!("JPEG encoding failed: {}", e)))?;

        Ok(out)
    }
}

/// Scan verdict. Derived by the classifier, never constructed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Good,
    Bad,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Good => "GOOD",
            Decision::Bad => "BAD",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fractions of each color channel in the sampled region, summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelRatios {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

/// Immutable output of one classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub decision: Decision,
    /// Estimated purity percentage in [0, 100], rounded to one decimal.
    pub purity: f64,
    /// Human-readable composition summary.
    pub composition: String,
    pub ratios: ChannelRatios,
}
