//! Region cropping helpers.

use image::imageops;

use crate::core::constants::DEFAULT_CROP_START;
use crate::domain::Frame;

/// Extracts the bottom `1 - crop_start` of a frame.
///
/// The MRZ always sits in the lower portion of the document, so OCR
/// strategies work on this band instead of the full capture. `crop_start`
/// is clamped to `0.0..=0.95`; [`DEFAULT_CROP_START`] keeps the bottom 35%.
pub fn crop_bottom(frame: &Frame, crop_start: f32) -> Frame {
    let crop_start = crop_start.clamp(0.0, 0.95);
    let (width, height) = frame.dimensions();
    let y = (height as f32 * crop_start) as u32;
    imageops::crop_imm(frame, 0, y, width, height - y).to_image()
}

/// [`crop_bottom`] with the default crop start.
pub fn crop_mrz_region(frame: &Frame) -> Frame {
    crop_bottom(frame, DEFAULT_CROP_START)
}

/// Crops a padded box out of a frame, clamping to the frame bounds.
pub fn crop_padded(frame: &Frame, x: f32, y: f32, w: f32, h: f32, padding: u32) -> Frame {
    let (fw, fh) = frame.dimensions();
    let pad = padding as f32;
    let x0 = (x - pad).max(0.0) as u32;
    let y0 = (y - pad).max(0.0) as u32;
    let x1 = ((x + w + pad).min(fw as f32)) as u32;
    let y1 = ((y + h + pad).min(fh as f32)) as u32;
    imageops::crop_imm(frame, x0, y0, x1.saturating_sub(x0).max(1), y1.saturating_sub(y0).max(1))
        .to_image()
}
