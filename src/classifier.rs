//! Color-based GOOD/BAD classification.
//!
//! A deliberately simple dominance test over average channel intensities in
//! a central region of interest: blue paper reads as a poly-blend (BAD),
//! white or light paper as cotton (GOOD). This is a placeholder heuristic
//! for demo rigs, not a calibrated model.

use crate::types::{ChannelRatios, ClassificationResult, Decision, Frame};

/// Fixed additive bias applied to the cotton estimate of a GOOD verdict,
/// rewarding whiteness.
const GOOD_PURITY_BIAS: f64 = 10.0;

/// GOOD purity at or above this threshold is reported as pure cotton.
const PURE_COTTON_THRESHOLD: f64 = 98.0;

/// Classify a frame. Pure and deterministic: no side effects, no hardware
/// access, identical pixel data yields identical results.
///
/// `margin` is the intensity excess blue must have over both red and green
/// for a BAD verdict (20 units on the reference rig).
pub fn classify(frame: &Frame, margin: f64) -> ClassificationResult {
    let (mean_r, mean_g, mean_b) = roi_channel_means(frame);
    log::debug!(
        "ROI mean RGB = ({:.1}, {:.1}, {:.1})",
        mean_r,
        mean_g,
        mean_b
    );

    let total = mean_r + mean_g + mean_b;
    let ratios = if total > 0.0 {
        ChannelRatios {
            red: mean_r / total,
            green: mean_g / total,
            blue: mean_b / total,
        }
    } else {
        // All-black ROI: no channel information, fall through to GOOD.
        ChannelRatios {
            red: 1.0 / 3.0,
            green: 1.0 / 3.0,
            blue: 1.0 / 3.0,
        }
    };

    // Two-sided dominance test: blue must strictly exceed both other
    // channels by the margin. Near-equal and low-light frames land on GOOD.
    let blue_dominant = mean_b > mean_g + margin && mean_b > mean_r + margin;

    let cotton_purity = (ratios.red + ratios.green) * 100.0;
    let poly_contamination = ratios.blue * 100.0;

    if blue_dominant {
        let purity = round1((100.0 - poly_contamination).max(0.0));
        let composition = format!(
            "{:.1}% Cotton / {:.1}% Poly blend",
            purity,
            round1(poly_contamination)
        );
        ClassificationResult {
            decision: Decision::Bad,
            purity,
            composition,
            ratios,
        }
    } else {
        let purity = round1((cotton_purity + GOOD_PURITY_BIAS).min(100.0));
        let composition = if purity >= PURE_COTTON_THRESHOLD {
            "100% Pure Cotton".to_string()
        } else {
            format!("{:.1}% Cotton", purity)
        };
        ClassificationResult {
            decision: Decision::Good,
            purity,
            composition,
            ratios,
        }
    }
}

/// Bounds of the sampled region: a centered square whose side is a quarter
/// of the shorter frame dimension. Returns (x, y, side).
pub(crate) fn roi_bounds(width: u32, height: u32) -> (u32, u32, u32) {
    let side = (width.min(height) / 4).max(1);
    let x = width.saturating_sub(side) / 2;
    let y = height.saturating_sub(side) / 2;
    (x, y, side)
}

/// Per-channel mean intensity over the region of interest.
fn roi_channel_means(frame: &Frame) -> (f64, f64, f64) {
    if !frame.is_valid_shape() {
        return (0.0, 0.0, 0.0);
    }

    let (x0, y0, side) = roi_bounds(frame.width, frame.height);
    let side_x = side.min(frame.width - x0);
    let side_y = side.min(frame.height - y0);

    let mut sum_r: u64 = 0;
    let mut sum_g: u64 = 0;
    let mut sum_b: u64 = 0;
    for y in y0..y0 + side_y {
        for x in x0..x0 + side_x {
            let [r, g, b] = frame.pixel(x, y);
            sum_r += u64::from(r);
            sum_g += u64::from(g);
            sum_b += u64::from(b);
        }
    }

    let count = (side_x as u64 * side_y as u64) as f64;
    (
        sum_r as f64 / count,
        sum_g as f64 / count,
        sum_b as f64 / count,
    )
}

/// Round to one decimal place for reporting.
pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{framed_roi, uniform_frame};

    const MARGIN: f64 = 20.0;

    #[test]
    fn test_deterministic_for_identical_frames() {
        let frame = uniform_frame(640, 480, [180, 170, 160]);
        let first = classify(&frame, MARGIN);
        let second = classify(&frame, MARGIN);
        assert_eq!(first, second);
    }

    #[test]
    fn test_uniform_gray_is_good() {
        // Equal channels: the dominance test requires strict excess on both
        // margins, so mid-gray must land on GOOD.
        let frame = uniform_frame(640, 480, [128, 128, 128]);
        let result = classify(&frame, MARGIN);
        assert_eq!(result.decision, Decision::Good);
    }

    #[test]
    fn test_blue_dominant_is_bad() {
        // Mean BGR (200, 50, 50): blue exceeds both others by well over the
        // margin.
        let frame = uniform_frame(640, 480, [50, 50, 200]);
        let result = classify(&frame, MARGIN);
        assert_eq!(result.decision, Decision::Bad);
    }

    #[test]
    fn test_blue_recessive_is_good() {
        // Mean BGR (50, 200, 200): blue is the weakest channel.
        let frame = uniform_frame(640, 480, [200, 200, 50]);
        let result = classify(&frame, MARGIN);
        assert_eq!(result.decision, Decision::Good);
    }

    #[test]
    fn test_margin_boundary_is_not_dominant() {
        // Blue exceeds both channels by exactly the margin: not strict
        // excess, so GOOD.
        let frame = uniform_frame(640, 480, [100, 100, 120]);
        let result = classify(&frame, MARGIN);
        assert_eq!(result.decision, Decision::Good);

        // One unit past the margin flips the verdict.
        let frame = uniform_frame(640, 480, [100, 100, 121]);
        let result = classify(&frame, MARGIN);
        assert_eq!(result.decision, Decision::Bad);
    }

    #[test]
    fn test_all_black_defaults_to_good_thirds() {
        let frame = uniform_frame(640, 480, [0, 0, 0]);
        let result = classify(&frame, MARGIN);
        assert_eq!(result.decision, Decision::Good);
        assert!((result.ratios.red - 1.0 / 3.0).abs() < 1e-9);
        assert!((result.ratios.green - 1.0 / 3.0).abs() < 1e-9);
        assert!((result.ratios.blue - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ratios_sum_to_one() {
        let frame = uniform_frame(640, 480, [90, 130, 210]);
        let result = classify(&frame, MARGIN);
        let sum = result.ratios.red + result.ratios.green + result.ratios.blue;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_only_roi_is_sampled() {
        // Blue border, white center: the verdict must come from the center
        // region only.
        let frame = framed_roi(640, 480, [30, 30, 220], [230, 230, 230]);
        let result = classify(&frame, MARGIN);
        assert_eq!(result.decision, Decision::Good);

        // And the inverse: white border, blue center.
        let frame = framed_roi(640, 480, [230, 230, 230], [30, 30, 220]);
        let result = classify(&frame, MARGIN);
        assert_eq!(result.decision, Decision::Bad);
    }

    #[test]
    fn test_bad_purity_from_contamination() {
        let frame = uniform_frame(640, 480, [50, 50, 200]);
        let result = classify(&frame, MARGIN);
        // blue fraction = 200/300, poly contamination ~66.7%.
        assert!((result.purity - 33.3).abs() < 0.05);
        assert!(result.composition.contains("Poly"));
    }

    #[test]
    fn test_good_white_reports_pure_cotton() {
        // White: blue fraction 1/3, cotton estimate 66.7 + 10 = 76.7.
        let frame = uniform_frame(640, 480, [255, 255, 255]);
        let result = classify(&frame, MARGIN);
        assert_eq!(result.decision, Decision::Good);
        assert!((result.purity - 76.7).abs() < 0.05);

        // A warm, blue-poor frame pushes the cotton estimate past the pure
        // threshold.
        let frame = uniform_frame(640, 480, [200, 200, 20]);
        let result = classify(&frame, MARGIN);
        assert_eq!(result.decision, Decision::Good);
        assert_eq!(result.composition, "100% Pure Cotton");
    }

    #[test]
    fn test_purity_bounds() {
        for rgb in [[0, 0, 0], [255, 255, 255], [10, 10, 250], [250, 10, 10]] {
            let result = classify(&uniform_frame(64, 64, rgb), MARGIN);
            assert!(
                (0.0..=100.0).contains(&result.purity),
                "purity {} out of range for {:?}",
                result.purity,
                rgb
            );
        }
    }

    #[test]
    fn test_roi_bounds_centered_quarter() {
        let (x, y, side) = roi_bounds(640, 480);
        assert_eq!(side, 120);
        assert_eq!(x, 260);
        assert_eq!(y, 180);

        // Degenerate tiny frames still sample at least one pixel.
        let (_, _, side) = roi_bounds(2, 2);
        assert_eq!(side, 1);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(33.333), 33.3);
        assert_eq!(round1(66.666), 66.7);
        assert_eq!(round1(100.0), 100.0);
    }
}
