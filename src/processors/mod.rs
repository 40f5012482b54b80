//! Image processing for MRZ extraction.
//!
//! * `crop` - MRZ region and padded face-box cropping
//! * `preprocess` - The binarization pipeline feeding the OCR collaborator

pub mod crop;
pub mod preprocess;

pub use crop::{crop_bottom, crop_mrz_region, crop_padded};
pub use preprocess::{preprocess_for_ocr, PreprocessConfig};
