//! Context-aware field cleaning and date parsing.
//!
//! Cleaning runs strictly after positional extraction so the fixed ICAO
//! offsets always see the raw OCR characters. Numeric context repairs the
//! classic letter-for-digit confusions, alphabetic context the reverse.

use chrono::{Datelike, Utc};

/// Repairs a field that must be digits: `O→0`, `I/L→1`, everything else
/// non-digit is dropped.
pub fn clean_numeric(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            'O' => Some('0'),
            'I' | 'L' => Some('1'),
            c if c.is_ascii_digit() => Some(c),
            _ => None,
        })
        .collect()
}

/// Repairs a field that must be letters: `0→O`, `1→I`, everything else
/// non-alphabetic is dropped (spaces survive for name fields).
pub fn clean_alpha(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            '0' => Some('O'),
            '1' => Some('I'),
            c if c.is_ascii_uppercase() || c == ' ' => Some(c),
            _ => None,
        })
        .collect()
}

/// Strips trailing filler characters.
pub fn trim_fillers(raw: &str) -> &str {
    raw.trim_matches('<')
}

/// Splits an ICAO name field into (surname, given names).
///
/// The primary identifier sits before the `<<` separator; single `<` fillers
/// inside either part are word separators.
pub fn parse_names(raw: &str) -> (String, String) {
    let raw = trim_fillers(raw);
    let (surname_part, given_part) = match raw.split_once("<<") {
        Some((s, g)) => (s, g),
        None => (raw, ""),
    };
    (name_words(surname_part), name_words(given_part))
}

fn name_words(part: &str) -> String {
    let words: Vec<String> = part
        .split('<')
        .map(clean_alpha)
        .filter(|w| !w.is_empty())
        .collect();
    words.join(" ")
}

/// Century bias for two-digit MRZ years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBias {
    /// Birth dates lie in the past.
    Past,
    /// Expiry dates lie around or after today.
    Future,
}

/// Parses a raw `YYMMDD` field into ISO `YYYY-MM-DD`, or `"UNKNOWN"`.
///
/// Uses the current UTC year as the pivot; see [`parse_date_with_pivot`].
pub fn parse_date(raw: &str, bias: DateBias) -> String {
    parse_date_with_pivot(raw, bias, Utc::now().year() % 100)
}

/// Parses a raw `YYMMDD` field with an explicit two-digit pivot year.
///
/// Expiry dates bias future: `yy <= (pivot + 30) mod 100` maps to 2000+yy,
/// otherwise 1900+yy. Birth dates bias past: `yy > pivot` maps to 1900+yy,
/// otherwise 2000+yy. Month must be 1..=12 and day 1..=31 or the result is
/// `"UNKNOWN"`.
pub fn parse_date_with_pivot(raw: &str, bias: DateBias, pivot_yy: i32) -> String {
    let digits = clean_numeric(raw);
    if digits.len() != 6 {
        return "UNKNOWN".to_string();
    }

    let yy: i32 = digits[0..2].parse().unwrap_or(-1);
    let mm: u32 = digits[2..4].parse().unwrap_or(0);
    let dd: u32 = digits[4..6].parse().unwrap_or(0);
    if yy < 0 || !(1..=12).contains(&mm) || !(1..=31).contains(&dd) {
        return "UNKNOWN".to_string();
    }

    let year = match bias {
        DateBias::Future => {
            if yy <= (pivot_yy + 30).rem_euclid(100) {
                2000 + yy
            } else {
                1900 + yy
            }
        }
        DateBias::Past => {
            if yy > pivot_yy {
                1900 + yy
            } else {
                2000 + yy
            }
        }
    };

    format!("{year:04}-{mm:02}-{dd:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_repairs_confusions() {
        assert_eq!(clean_numeric("74O8I2"), "740812");
        assert_eq!(clean_numeric("12L4"), "1214");
        assert_eq!(clean_numeric("<<12<"), "12");
    }

    #[test]
    fn test_alpha_repairs_confusions() {
        assert_eq!(clean_alpha("ER0KSS1N"), "EROKSSIN");
        assert_eq!(clean_alpha("UT0"), "UTO");
        assert_eq!(clean_alpha("A9B"), "AB");
    }

    #[test]
    fn test_names_happy_path() {
        let (last, first) = parse_names("ERIKSSON<<ANNA<MARIA<<<<<<<<<<");
        assert_eq!(last, "ERIKSSON");
        assert_eq!(first, "ANNA MARIA");
    }

    #[test]
    fn test_names_digit_noise_restored() {
        let (last, first) = parse_names("ERIKSS0N<<ANNA<<<<");
        assert_eq!(last, "ERIKSSON");
        assert_eq!(first, "ANNA");
    }

    #[test]
    fn test_names_without_separator() {
        let (last, first) = parse_names("ERIKSSON<<<<");
        assert_eq!(last, "ERIKSSON");
        assert_eq!(first, "");
    }

    #[test]
    fn test_birth_dates_bias_past() {
        // Pivot 26: 74 > 26 -> 1974; 04 <= 26 -> 2004.
        assert_eq!(
            parse_date_with_pivot("740812", DateBias::Past, 26),
            "1974-08-12"
        );
        assert_eq!(
            parse_date_with_pivot("040812", DateBias::Past, 26),
            "2004-08-12"
        );
    }

    #[test]
    fn test_expiry_dates_bias_future() {
        // Pivot 26: window reaches (26+30)%100 = 56.
        assert_eq!(
            parse_date_with_pivot("120415", DateBias::Future, 26),
            "2012-04-15"
        );
        assert_eq!(
            parse_date_with_pivot("550101", DateBias::Future, 26),
            "2055-01-01"
        );
        assert_eq!(
            parse_date_with_pivot("990101", DateBias::Future, 26),
            "1999-01-01"
        );
    }

    #[test]
    fn test_expiry_window_wraps_near_century_end() {
        // Pivot 95: window reaches (95+30)%100 = 25.
        assert_eq!(
            parse_date_with_pivot("100101", DateBias::Future, 95),
            "2010-01-01"
        );
        assert_eq!(
            parse_date_with_pivot("970101", DateBias::Future, 95),
            "1997-01-01"
        );
    }

    #[test]
    fn test_invalid_dates_are_unknown() {
        assert_eq!(parse_date_with_pivot("741312", DateBias::Past, 26), "UNKNOWN");
        assert_eq!(parse_date_with_pivot("740800", DateBias::Past, 26), "UNKNOWN");
        assert_eq!(parse_date_with_pivot("<<<<<<", DateBias::Past, 26), "UNKNOWN");
        assert_eq!(parse_date_with_pivot("7408", DateBias::Past, 26), "UNKNOWN");
    }

    #[test]
    fn test_ocr_damaged_date_still_parses() {
        assert_eq!(
            parse_date_with_pivot("74O8I2", DateBias::Past, 26),
            "1974-08-12"
        );
    }
}
