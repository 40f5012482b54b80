//! Phase 1: MRZ extraction through a three-strategy OCR ladder.
//!
//! Strategies run in order (full frame, bottom-40% crop, preprocessed crop)
//! and the first whose cleaned text reaches 60 characters wins. Below
//! that, the longest result still wins if it reaches 30 characters;
//! otherwise the capture is unreadable. Each strategy runs a whitelisted
//! OCR pass first and repeats without the whitelist when the yield is thin,
//! because some OCR builds drop the `<` filler under an active whitelist.

use image::DynamicImage;

use crate::core::constants::{MRZ_ACCEPT_LEN, MRZ_CROP_START, MRZ_MIN_LEN, OCR_DPI};
use crate::core::errors::{VerifyError, VerifyResult};
use crate::core::events::{EventSink, PipelineEvent};
use crate::core::traits::{OcrEngine, OcrOptions, PageSegMode};
use crate::domain::{Frame, MrzRecord};
use crate::mrz::clean::clean_ocr_text;
use crate::mrz::parse::parse_with_pivot;
use crate::processors::crop::crop_bottom;
use crate::processors::preprocess::{preprocess_for_ocr, PreprocessConfig};

const MRZ_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789<";

const STRATEGY_LABELS: [&str; 3] = ["full frame", "MRZ crop", "preprocessed crop"];

/// Runs MRZ extraction on a back-of-document frame.
pub fn extract_mrz(
    ocr: &mut dyn OcrEngine,
    events: &mut dyn EventSink,
    frame: &Frame,
    pivot_yy: i32,
    preprocess: &PreprocessConfig,
) -> VerifyResult<MrzRecord> {
    let mut best: Option<String> = None;
    let mut winner: Option<String> = None;

    for (idx, label) in STRATEGY_LABELS.iter().enumerate() {
        events.emit(PipelineEvent::Progress {
            label: format!("reading MRZ: {label}"),
            pct: (idx as u8) * 30,
        });

        let owned;
        let image: &Frame = match idx {
            0 => frame,
            1 => {
                owned = crop_bottom(frame, MRZ_CROP_START);
                &owned
            }
            _ => {
                let crop = crop_bottom(frame, MRZ_CROP_START);
                let binarized = preprocess_for_ocr(&crop, preprocess);
                owned = DynamicImage::ImageLuma8(binarized).to_rgba8();
                &owned
            }
        };

        let cleaned = recognize_with_passes(ocr, image)?;
        let len = stripped_len(&cleaned);
        tracing::debug!(strategy = %label, cleaned_len = len, "OCR strategy finished");

        if len >= MRZ_ACCEPT_LEN {
            winner = Some(cleaned);
            break;
        }
        if best.as_ref().map_or(true, |b| stripped_len(b) < len) {
            best = Some(cleaned);
        }
    }

    let text = match winner {
        Some(text) => text,
        None => {
            let best_len = best.as_ref().map(|b| stripped_len(b)).unwrap_or(0);
            if best_len >= MRZ_MIN_LEN {
                best.unwrap_or_default()
            } else {
                return Err(VerifyError::MrzUnreadable {
                    context: format!(
                        "best strategy produced {best_len} cleaned characters, need {MRZ_MIN_LEN}"
                    ),
                });
            }
        }
    };

    events.emit(PipelineEvent::Progress {
        label: "parsing MRZ".to_string(),
        pct: 90,
    });
    parse_with_pivot(&text, pivot_yy)
}

/// Two OCR passes: whitelisted uniform block, then an open pass when the
/// whitelisted yield stays under the acceptance bar. Returns the longer
/// cleaned result.
fn recognize_with_passes(ocr: &mut dyn OcrEngine, image: &Frame) -> VerifyResult<String> {
    let whitelisted = OcrOptions {
        psm: PageSegMode::UniformBlock,
        whitelist: Some(MRZ_WHITELIST.to_string()),
        dpi: OCR_DPI,
        preserve_spaces: true,
    };
    let first = clean_ocr_text(&ocr.recognize(image, &whitelisted)?.text);
    if stripped_len(&first) >= MRZ_ACCEPT_LEN {
        return Ok(first);
    }

    let open = OcrOptions {
        whitelist: None,
        ..whitelisted
    };
    let second = clean_ocr_text(&ocr.recognize(image, &open)?.text);

    if stripped_len(&second) > stripped_len(&first) {
        Ok(second)
    } else {
        Ok(first)
    }
}

fn stripped_len(text: &str) -> usize {
    text.chars().filter(|c| *c != '\n').count()
}
