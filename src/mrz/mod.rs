//! The MRZ engine: OCR-text cleaning, checksum validation, positional
//! parsing for TD1/TD2/TD3, and extraction quality scoring.
//!
//! * `checksum` - ICAO 9303 check digits (weights `[7,3,1]`)
//! * `clean` - OCR output cleaning and fixed-width line recovery
//! * `fields` - Context-aware field repair and two-digit-year date parsing
//! * `parse` - Format detection and positional extraction
//! * `quality` - 0..100 quality score and band

pub mod checksum;
pub mod clean;
pub mod fields;
pub mod parse;
pub mod quality;

pub use checksum::{check_digit, verify};
pub use clean::{clean_ocr_text, pad_line, recover_lines};
pub use fields::{clean_alpha, clean_numeric, parse_date, parse_date_with_pivot, DateBias};
pub use parse::{parse, parse_with_pivot};
pub use quality::{score, QualityInputs};
