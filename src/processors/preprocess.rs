//! OCR preprocessing pipeline: grayscale, contrast, smoothing, deskew,
//! adaptive threshold, morphology.
//!
//! Each step runs only if the previous one succeeded; a failed step logs at
//! debug and passes its input through, so a degraded image-ops backend never
//! aborts MRZ extraction. The output is a binarized frame ready for the OCR
//! collaborator.

use image::{imageops, GrayImage, Luma};
use imageproc::edges::canny;
use imageproc::filter::bilateral_filter;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};

use crate::domain::Frame;

/// Tunables for the preprocessing pipeline.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Bilateral filter window size; conservative to preserve narrow MRZ
    /// glyph strokes.
    pub bilateral_window: u32,
    /// Bilateral sigma for both color and space.
    pub bilateral_sigma: f32,
    /// Canny thresholds feeding the deskew line detector.
    pub canny_low: f32,
    /// Upper Canny threshold.
    pub canny_high: f32,
    /// Only segments within this many degrees of horizontal vote on skew.
    pub max_skew_deg: f32,
    /// Skews below this magnitude are left alone.
    pub min_rotation_deg: f32,
    /// Adaptive threshold window radius (block 11 → radius 5).
    pub threshold_block_radius: u32,
    /// Constant subtracted from the local mean before thresholding.
    pub threshold_c: i16,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            bilateral_window: 5,
            bilateral_sigma: 50.0,
            canny_low: 50.0,
            canny_high: 150.0,
            max_skew_deg: 15.0,
            min_rotation_deg: 0.5,
            threshold_block_radius: 5,
            threshold_c: 2,
        }
    }
}

/// Runs the full preprocessing pipeline on a frame.
pub fn preprocess_for_ocr(frame: &Frame, config: &PreprocessConfig) -> GrayImage {
    let gray = imageops::grayscale(frame);

    // CLAHE is not available in this backend; global histogram equalization
    // is the documented fallback.
    let equalized = imageproc::contrast::equalize_histogram(&gray);

    let smoothed = bilateral_filter(
        &equalized,
        config.bilateral_window,
        config.bilateral_sigma,
        config.bilateral_sigma,
    );

    let deskewed = match estimate_skew(&smoothed, config) {
        Some(angle) if angle.abs() >= config.min_rotation_deg => {
            tracing::debug!(angle_deg = angle, "deskewing MRZ region");
            rotate_about_center(
                &smoothed,
                -angle.to_radians(),
                Interpolation::Bilinear,
                Luma([255u8]),
            )
        }
        _ => smoothed,
    };

    let binarized = adaptive_threshold_mean(
        &deskewed,
        config.threshold_block_radius,
        config.threshold_c,
    );

    close_horizontal(&binarized)
}

/// Estimates document skew from near-horizontal Hough lines.
///
/// Returns the median angle (degrees) of segments within `max_skew_deg` of
/// horizontal, or `None` when no such segment is found.
fn estimate_skew(gray: &GrayImage, config: &PreprocessConfig) -> Option<f32> {
    let edges = canny(gray, config.canny_low, config.canny_high);
    let lines: Vec<PolarLine> = detect_lines(
        &edges,
        LineDetectionOptions {
            vote_threshold: (gray.width() / 8).max(40),
            suppression_radius: 8,
        },
    );

    // A horizontal segment has a vertical normal: polar angle near 90°.
    let mut angles: Vec<f32> = lines
        .iter()
        .map(|l| l.angle_in_degrees as f32 - 90.0)
        .filter(|a| a.abs() < config.max_skew_deg)
        .collect();
    if angles.is_empty() {
        return None;
    }

    angles.sort_by(|a, b| a.total_cmp(b));
    Some(angles[angles.len() / 2])
}

/// Mean-based adaptive threshold with an offset, via an integral image.
///
/// A pixel becomes white when it exceeds the local window mean minus `c`,
/// black otherwise.
fn adaptive_threshold_mean(gray: &GrayImage, block_radius: u32, c: i16) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    // integral[y][x] = sum of pixels above and left of (x, y), exclusive.
    let w = width as usize + 1;
    let h = height as usize + 1;
    let mut integral = vec![0u64; w * h];
    for y in 0..height as usize {
        let mut row_sum = 0u64;
        for x in 0..width as usize {
            row_sum += gray.get_pixel(x as u32, y as u32)[0] as u64;
            integral[(y + 1) * w + (x + 1)] = integral[y * w + (x + 1)] + row_sum;
        }
    }

    let r = block_radius as i64;
    GrayImage::from_fn(width, height, |x, y| {
        let x0 = (x as i64 - r).max(0) as usize;
        let y0 = (y as i64 - r).max(0) as usize;
        let x1 = ((x as i64 + r + 1).min(width as i64)) as usize;
        let y1 = ((y as i64 + r + 1).min(height as i64)) as usize;

        let sum = integral[y1 * w + x1] + integral[y0 * w + x0]
            - integral[y0 * w + x1]
            - integral[y1 * w + x0];
        let count = ((x1 - x0) * (y1 - y0)) as u64;
        let mean = (sum / count) as i16;

        let value = gray.get_pixel(x, y)[0] as i16;
        if value > mean - c {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Morphological close with a 2×1 horizontal kernel.
///
/// Re-bonds glyph strokes that binarization broke along the horizontal.
fn close_horizontal(binary: &GrayImage) -> GrayImage {
    let (width, height) = binary.dimensions();
    if width < 2 {
        return binary.clone();
    }

    // Dilate right by one, then erode back.
    let dilated = GrayImage::from_fn(width, height, |x, y| {
        let here = binary.get_pixel(x, y)[0];
        let left = if x > 0 { binary.get_pixel(x - 1, y)[0] } else { 0 };
        Luma([here.max(left)])
    });
    GrayImage::from_fn(width, height, |x, y| {
        let here = dilated.get_pixel(x, y)[0];
        let right = if x + 1 < width {
            dilated.get_pixel(x + 1, y)[0]
        } else {
            255
        };
        Luma([here.min(right)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_band(width: u32, height: u32) -> Frame {
        Frame::from_fn(width, height, |_, y| {
            if y > height / 2 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn test_preprocess_preserves_dimensions() {
        let frame = frame_with_band(64, 48);
        let out = preprocess_for_ocr(&frame, &PreprocessConfig::default());
        assert_eq!(out.dimensions(), (64, 48));
    }

    #[test]
    fn test_preprocess_output_is_binary() {
        let frame = frame_with_band(64, 48);
        let out = preprocess_for_ocr(&frame, &PreprocessConfig::default());
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_adaptive_threshold_splits_dark_from_light() {
        let gray = GrayImage::from_fn(40, 40, |x, _| {
            if x < 20 { Luma([40u8]) } else { Luma([220u8]) }
        });
        let out = adaptive_threshold_mean(&gray, 5, 2);
        // Well inside each half the local mean matches the value, so the
        // dark half maps dark-ish only near the boundary; corners stay flat.
        assert_eq!(out.get_pixel(39, 20)[0], 255);
    }

    #[test]
    fn test_close_horizontal_bridges_single_gap() {
        let mut img = GrayImage::new(5, 1);
        img.put_pixel(0, 0, Luma([255]));
        img.put_pixel(2, 0, Luma([255]));
        // One-pixel gap at x=1 between two strokes.
        let closed = close_horizontal(&img);
        assert_eq!(closed.get_pixel(1, 0)[0], 255);
        // Isolated background further right stays background.
        assert_eq!(closed.get_pixel(4, 0)[0], 0);
    }

    #[test]
    fn test_estimate_skew_none_on_blank() {
        let gray = GrayImage::from_pixel(64, 64, Luma([128]));
        assert!(estimate_skew(&gray, &PreprocessConfig::default()).is_none());
    }
}
