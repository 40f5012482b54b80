//! Positional MRZ parsing for the TD1, TD3, and TD2 formats.
//!
//! Detection tries the formats in that fixed order. Positional extraction
//! always runs on the raw OCR characters; context-aware cleaning and the
//! date pivot apply afterwards. Check-digit failures never abort a parse,
//! they accumulate as warnings on the record's [`ChecksumReport`].

use chrono::{Datelike, Utc};

use crate::core::errors::{VerifyError, VerifyResult};
use crate::domain::mrz::{ChecksumReport, DocumentType, Gender, MrzRecord};
use crate::mrz::checksum;
use crate::mrz::clean::{pad_line, recover_lines};
use crate::mrz::fields::{
    clean_alpha, parse_date_with_pivot, parse_names, trim_fillers, DateBias,
};
use crate::mrz::quality::{self, QualityInputs};

/// Parses cleaned MRZ text into a record, using the current UTC year as the
/// two-digit date pivot.
pub fn parse(text: &str) -> VerifyResult<MrzRecord> {
    parse_with_pivot(text, Utc::now().year() % 100)
}

/// Parses cleaned MRZ text with an explicit two-digit pivot year.
///
/// Input is either 2-3 newline-separated cleaned lines or a collapsed
/// block, in which case fixed-width line recovery runs first.
pub fn parse_with_pivot(text: &str, pivot_yy: i32) -> VerifyResult<MrzRecord> {
    let text = text.trim();
    let cleaned_len = text.chars().filter(|c| *c != '\n').count();

    if text.contains('\n') {
        let lines: Vec<&str> = text.lines().collect();
        for ty in [DocumentType::Td1, DocumentType::Td3, DocumentType::Td2] {
            if let Some(padded) = fit_lines(&lines, ty) {
                if let Some(record) = parse_format(ty, &padded, pivot_yy, cleaned_len) {
                    return Ok(record);
                }
            }
        }
    } else {
        // No line structure survived OCR: try the fixed-width recoveries.
        for candidate in recover_lines(text) {
            let ty = match candidate[0].len() {
                30 => DocumentType::Td1,
                44 => DocumentType::Td3,
                _ => DocumentType::Td2,
            };
            if let Some(record) = parse_format(ty, &candidate, pivot_yy, cleaned_len) {
                return Ok(record);
            }
        }
    }

    Err(VerifyError::MrzUnparseable {
        context: format!(
            "no format accepted {} cleaned characters across {} line(s)",
            cleaned_len,
            text.lines().count()
        ),
    })
}

/// Pads natural lines to a format's canonical width when they plausibly fill
/// its layout: correct line count and at most 10 characters short in total.
fn fit_lines(lines: &[&str], ty: DocumentType) -> Option<Vec<String>> {
    if lines.len() != ty.line_count() {
        return None;
    }
    let width = ty.line_len();
    let total: usize = lines.iter().map(|l| l.chars().count().min(width)).sum();
    if total + 10 < ty.expected_total_len() {
        return None;
    }
    Some(lines.iter().map(|l| pad_line(l, width)).collect())
}

/// Raw positional extracts common to all three formats.
struct RawFields {
    id_number: String,
    names_raw: String,
    dob_raw: String,
    sex_byte: u8,
    expiry_raw: String,
    nationality_raw: String,
    optional_raw: String,
    report: ChecksumReport,
}

fn parse_format(
    ty: DocumentType,
    lines: &[String],
    pivot_yy: i32,
    cleaned_len: usize,
) -> Option<MrzRecord> {
    let raw = match ty {
        DocumentType::Td1 => extract_td1(lines),
        DocumentType::Td3 => extract_td3(lines),
        DocumentType::Td2 => extract_td2(lines),
    };

    // Acceptance: the mandatory fields must materialize. A wrong-format
    // split leaves the date-of-birth slice without digits.
    let dob_digits = crate::mrz::fields::clean_numeric(&raw.dob_raw);
    if raw.id_number.is_empty() || dob_digits.len() < 4 {
        tracing::debug!(
            format = %ty,
            id_len = raw.id_number.len(),
            dob_digits = dob_digits.len(),
            "format rejected: mandatory fields did not materialize"
        );
        return None;
    }

    let (last_name, first_name) = parse_names(&raw.names_raw);
    let date_of_birth = parse_date_with_pivot(&raw.dob_raw, DateBias::Past, pivot_yy);
    let expiry_date = parse_date_with_pivot(&raw.expiry_raw, DateBias::Future, pivot_yy);
    let nationality = clean_alpha(trim_fillers(&raw.nationality_raw));

    let quality = quality::score(&QualityInputs {
        document_type: ty,
        cleaned_len,
        checksum_failures: raw.report.failures(),
        first_name: &first_name,
        last_name: &last_name,
        id_number: &raw.id_number,
        date_of_birth: &date_of_birth,
        raw_name_field: &raw.names_raw,
    });

    Some(MrzRecord {
        first_name,
        last_name,
        id_number: raw.id_number,
        date_of_birth,
        gender: Gender::from_mrz_byte(raw.sex_byte),
        expiry_date,
        nationality,
        document_type: ty,
        optional_data: trim_fillers(&raw.optional_raw).to_string(),
        raw_lines: lines.to_vec(),
        quality,
        checksum_report: raw.report,
    })
}

fn extract_td1(lines: &[String]) -> RawFields {
    let (l1, l2, l3) = (&lines[0], &lines[1], &lines[2]);
    let mut report = ChecksumReport::default();

    // Document number: prefer the 9-character form when its check digit
    // validates, else take the 10-character slice.
    let doc9 = &l1[5..14];
    let doc_check = l1.as_bytes()[14];
    let id_number = if checksum::verify(doc9, doc_check) {
        trim_fillers(doc9).to_string()
    } else {
        report.warn("document number");
        trim_fillers(&l1[5..15]).to_string()
    };

    if !checksum::verify(&l2[0..6], l2.as_bytes()[6]) {
        report.warn("date of birth");
    }
    if !checksum::verify(&l2[8..14], l2.as_bytes()[14]) {
        report.warn("expiry date");
    }

    let composite = format!("{}{}{}{}", &l1[5..30], &l2[0..7], &l2[8..15], &l2[18..29]);
    if !checksum::verify(&composite, l2.as_bytes()[29]) {
        report.warn("composite");
    }

    RawFields {
        id_number,
        names_raw: l3.clone(),
        dob_raw: l2[0..6].to_string(),
        sex_byte: l2.as_bytes()[7],
        expiry_raw: l2[8..14].to_string(),
        nationality_raw: l2[15..18].to_string(),
        optional_raw: l1[15..30].to_string(),
        report,
    }
}

fn extract_td3(lines: &[String]) -> RawFields {
    let (l1, l2) = (&lines[0], &lines[1]);
    let mut report = ChecksumReport::default();

    // l1[0..2] is the document code ('P<'); not asserted, malformed prefixes
    // pass through.
    let doc = &l2[0..9];
    if !checksum::verify(doc, l2.as_bytes()[9]) {
        report.warn("document number");
    }
    if !checksum::verify(&l2[13..19], l2.as_bytes()[19]) {
        report.warn("date of birth");
    }
    if !checksum::verify(&l2[21..27], l2.as_bytes()[27]) {
        report.warn("expiry date");
    }

    let personal = &l2[28..42];
    if !trim_fillers(personal).is_empty() && !checksum::verify(personal, l2.as_bytes()[42]) {
        report.warn("personal number");
    }

    let composite = format!("{}{}{}", &l2[0..10], &l2[13..20], &l2[21..43]);
    if !checksum::verify(&composite, l2.as_bytes()[43]) {
        report.warn("composite");
    }

    RawFields {
        id_number: trim_fillers(doc).to_string(),
        names_raw: l1[5..44].to_string(),
        dob_raw: l2[13..19].to_string(),
        sex_byte: l2.as_bytes()[20],
        expiry_raw: l2[21..27].to_string(),
        nationality_raw: l2[10..13].to_string(),
        optional_raw: personal.to_string(),
        report,
    }
}

fn extract_td2(lines: &[String]) -> RawFields {
    let (l1, l2) = (&lines[0], &lines[1]);
    let mut report = ChecksumReport::default();

    let doc = &l2[0..9];
    if !checksum::verify(doc, l2.as_bytes()[9]) {
        report.warn("document number");
    }
    if !checksum::verify(&l2[13..19], l2.as_bytes()[19]) {
        report.warn("date of birth");
    }
    if !checksum::verify(&l2[21..27], l2.as_bytes()[27]) {
        report.warn("expiry date");
    }

    let composite = format!("{}{}{}", &l2[0..10], &l2[13..20], &l2[21..35]);
    if !checksum::verify(&composite, l2.as_bytes()[35]) {
        report.warn("composite");
    }

    RawFields {
        id_number: trim_fillers(doc).to_string(),
        names_raw: l1[5..36].to_string(),
        dob_raw: l2[13..19].to_string(),
        sex_byte: l2.as_bytes()[20],
        expiry_raw: l2[21..27].to_string(),
        nationality_raw: l2[10..13].to_string(),
        optional_raw: l2[28..35].to_string(),
        report,
    }
}
