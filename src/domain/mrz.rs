//! Parsed MRZ record and its quality metadata.

use serde::{Deserialize, Serialize};

use crate::core::constants::{TD1_LINE_LEN, TD2_LINE_LEN, TD3_LINE_LEN};

/// ICAO 9303 document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    /// 3 lines × 30 characters (ID cards).
    Td1,
    /// 2 lines × 36 characters (smaller ID cards).
    Td2,
    /// 2 lines × 44 characters (passports).
    Td3,
}

impl DocumentType {
    /// Canonical line length for this format.
    pub fn line_len(&self) -> usize {
        match self {
            Self::Td1 => TD1_LINE_LEN,
            Self::Td2 => TD2_LINE_LEN,
            Self::Td3 => TD3_LINE_LEN,
        }
    }

    /// Number of MRZ lines in this format.
    pub fn line_count(&self) -> usize {
        match self {
            Self::Td1 => 3,
            Self::Td2 | Self::Td3 => 2,
        }
    }

    /// Total character count of a complete zone (90/72/88).
    pub fn expected_total_len(&self) -> usize {
        self.line_len() * self.line_count()
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Td1 => write!(f, "TD1"),
            Self::Td2 => write!(f, "TD2"),
            Self::Td3 => write!(f, "TD3"),
        }
    }
}

/// Holder gender as recorded in the MRZ sex byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
    /// Unspecified (`<`) or unrecognized byte.
    X,
}

impl Gender {
    /// Maps the raw MRZ sex byte; anything other than `M`/`F` becomes [`Gender::X`].
    pub fn from_mrz_byte(byte: u8) -> Self {
        match byte {
            b'M' => Self::M,
            b'F' => Self::F,
            _ => Self::X,
        }
    }
}

/// One warning per failed check digit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumReport {
    /// Human-readable warnings, e.g. `"date of birth check digit failed"`.
    pub warnings: Vec<String>,
}

impl ChecksumReport {
    /// Records a failed check digit.
    pub fn warn(&mut self, what: &str) {
        self.warnings.push(format!("{what} check digit failed"));
    }

    /// Number of failed check digits.
    pub fn failures(&self) -> usize {
        self.warnings.len()
    }
}

/// Quality band derived from the 0..100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityBand {
    Low,
    Medium,
    High,
}

/// Extraction quality of a parsed MRZ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrzQuality {
    /// Aggregate score in 0..=100.
    pub score: u8,
    /// Band: `>=80` High, `>=60` Medium, else Low.
    pub band: QualityBand,
    /// One entry per deduction taken.
    pub issues: Vec<String>,
}

impl MrzQuality {
    /// Builds the quality value, deriving the band from the score.
    pub fn new(score: u8, issues: Vec<String>) -> Self {
        let band = if score >= 80 {
            QualityBand::High
        } else if score >= 60 {
            QualityBand::Medium
        } else {
            QualityBand::Low
        };
        Self { score, band, issues }
    }
}

/// Identity fields parsed from a machine-readable zone.
///
/// Created once at phase 1 completion and read-only thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrzRecord {
    /// Given names, `<` fillers resolved to spaces.
    pub first_name: String,
    /// Primary identifier (surname).
    pub last_name: String,
    /// Document number.
    pub id_number: String,
    /// ISO `YYYY-MM-DD`, or `"UNKNOWN"` when the field did not parse.
    pub date_of_birth: String,
    /// Holder gender.
    pub gender: Gender,
    /// ISO `YYYY-MM-DD`, or `"UNKNOWN"` when the field did not parse.
    pub expiry_date: String,
    /// Issuing-state or nationality code (3 letters, fillers stripped).
    pub nationality: String,
    /// Which ICAO format matched.
    pub document_type: DocumentType,
    /// Optional data (TD1 line-1 tail or TD3 personal number), fillers trimmed.
    pub optional_data: String,
    /// The accepted lines, each padded to the format's canonical length.
    pub raw_lines: Vec<String>,
    /// Extraction quality.
    pub quality: MrzQuality,
    /// One warning per failed check digit.
    pub checksum_report: ChecksumReport,
}
