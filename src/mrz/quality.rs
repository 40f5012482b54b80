//! MRZ extraction quality scoring.
//!
//! Four components, 100 points total: length fit (20), check digits (30),
//! field completeness (30), and character plausibility (20). The band is
//! High at 80+, Medium at 60+, Low below.

use crate::domain::mrz::{DocumentType, MrzQuality};

/// Everything the scorer looks at.
pub struct QualityInputs<'a> {
    pub document_type: DocumentType,
    /// Newline-stripped length of the cleaned text that entered parsing.
    pub cleaned_len: usize,
    /// Failed check digits.
    pub checksum_failures: usize,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub id_number: &'a str,
    /// ISO date or `"UNKNOWN"`.
    pub date_of_birth: &'a str,
    /// Name field as positionally extracted, before cleaning.
    pub raw_name_field: &'a str,
}

/// Scores an accepted parse.
pub fn score(inputs: &QualityInputs) -> MrzQuality {
    let mut score = 0u8;
    let mut issues = Vec::new();

    let expected = inputs.document_type.expected_total_len();
    let diff = inputs.cleaned_len.abs_diff(expected);
    score += match diff {
        0 => 20,
        1..=5 => 15,
        6..=10 => 10,
        _ => 0,
    };
    if diff > 0 {
        issues.push(format!(
            "length differs from {} by {diff}",
            inputs.document_type
        ));
    }

    score += match inputs.checksum_failures {
        0 => 30,
        1 => 20,
        2 => 10,
        _ => 0,
    };
    if inputs.checksum_failures > 0 {
        issues.push(format!(
            "{} check digit(s) failed",
            inputs.checksum_failures
        ));
    }

    let mut missing = Vec::new();
    if inputs.first_name.is_empty() {
        missing.push("first name");
    }
    if inputs.last_name.is_empty() {
        missing.push("last name");
    }
    if inputs.id_number.is_empty() {
        missing.push("document number");
    }
    if inputs.date_of_birth == "UNKNOWN" {
        missing.push("date of birth");
    }
    score += match missing.len() {
        0 => 30,
        1 => 20,
        _ => 10,
    };
    if !missing.is_empty() {
        issues.push(format!("missing fields: {}", missing.join(", ")));
    }

    let names_have_digits = inputs.raw_name_field.bytes().any(|b| b.is_ascii_digit());
    let id_has_letters = inputs.id_number.bytes().any(|b| b.is_ascii_alphabetic());
    let violations = usize::from(names_have_digits) + usize::from(id_has_letters);
    score += match violations {
        0 => 20,
        1 => 10,
        _ => 0,
    };
    if names_have_digits {
        issues.push("digits in name field".to_string());
    }
    if id_has_letters {
        issues.push("letters in document number".to_string());
    }

    MrzQuality::new(score, issues)
}
