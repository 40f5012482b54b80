//! Portrait extraction from the front of the document.

use crate::core::constants::{FACE_MIN_CONFIDENCE, FAST_DETECTOR_INPUT_SIZE, PORTRAIT_PADDING_PX};
use crate::core::errors::{VerifyError, VerifyResult};
use crate::core::traits::{DetectionMode, FaceScanner};
use crate::domain::{Frame, Portrait};
use crate::processors::crop::crop_padded;

/// Finds the document portrait and computes its descriptor.
///
/// Runs the accurate detector first; when it finds nothing, falls back to
/// the fast detector at a fixed input size with the same threshold. The face
/// box is cropped with 20 px of padding on every side.
pub fn extract_portrait(scanner: &mut dyn FaceScanner, frame: &Frame) -> VerifyResult<Portrait> {
    let detection = match scanner.detect(
        frame,
        &DetectionMode::Accurate {
            min_confidence: FACE_MIN_CONFIDENCE,
        },
    )? {
        Some(d) => d,
        None => {
            tracing::debug!("accurate detector found no document face, trying fast fallback");
            scanner
                .detect(
                    frame,
                    &DetectionMode::Fast {
                        input_size: FAST_DETECTOR_INPUT_SIZE,
                        score_threshold: FACE_MIN_CONFIDENCE,
                    },
                )?
                .ok_or(VerifyError::NoFaceOnDocument)?
        }
    };

    let b = detection.face_box;
    let crop = crop_padded(frame, b.x, b.y, b.width, b.height, PORTRAIT_PADDING_PX);
    Portrait::new(crop, detection.descriptor)
}
