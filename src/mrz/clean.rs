//! OCR output cleaning and MRZ line selection.
//!
//! Raw OCR text arrives with mixed case, stray punctuation, and broken or
//! missing line structure. Cleaning reduces it to the MRZ alphabet
//! `[A-Z0-9<]`, keeps the lines that plausibly belong to the zone, and when
//! no usable line structure survived, collapses everything into one block for
//! fixed-width recovery.

use crate::core::constants::{TD1_LINE_LEN, TD2_LINE_LEN, TD3_LINE_LEN};

/// Reduces one line to uppercase characters of the MRZ alphabet.
fn sanitize_line(line: &str) -> String {
    line.chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '<')
        .collect()
}

/// Whether a sanitized line plausibly belongs to an MRZ.
fn is_mrz_line(line: &str) -> bool {
    let fillers = line.bytes().filter(|b| *b == b'<').count();
    line.len() >= 25 || (fillers >= 2 && line.len() >= 10)
}

/// Cleans raw OCR output into candidate MRZ text.
///
/// When two or more plausible lines survive, the two or three longest are
/// kept in their original order (three only if the third still has 25+
/// characters) and joined with `\n`. Otherwise the entire output collapses
/// into a single block without newlines, ready for [`recover_lines`].
///
/// The function is idempotent: cleaning already-clean text returns it
/// unchanged.
pub fn clean_ocr_text(raw: &str) -> String {
    let lines: Vec<String> = raw
        .split(['\r', '\n'])
        .map(sanitize_line)
        .filter(|l| !l.is_empty())
        .collect();

    let kept: Vec<&String> = lines.iter().filter(|l| is_mrz_line(l)).collect();

    if kept.len() >= 2 {
        // Rank by length, keep the winners in original order.
        let mut order: Vec<usize> = (0..kept.len()).collect();
        order.sort_by(|&a, &b| kept[b].len().cmp(&kept[a].len()).then(a.cmp(&b)));

        let take = if kept.len() >= 3 && kept[order[2]].len() >= 25 {
            3
        } else {
            2
        };
        let mut chosen = order[..take].to_vec();
        chosen.sort_unstable();

        chosen
            .into_iter()
            .map(|i| kept[i].as_str())
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        // No usable line structure: collapse for width-based splitting.
        sanitize_line(raw)
    }
}

/// Right-pads with `<` (or truncates) to exactly `width` characters.
pub fn pad_line(line: &str, width: usize) -> String {
    let mut s: String = line.chars().take(width).collect();
    while s.len() < width {
        s.push('<');
    }
    s
}

/// Splits a collapsed block into `count` fixed-width lines, padding the tail.
///
/// Returns `None` when the block cannot fill the layout beyond one line.
fn split_fixed(block: &str, count: usize, width: usize) -> Option<Vec<String>> {
    if block.len() <= width {
        return None;
    }
    let chars: Vec<char> = block.chars().collect();
    let mut lines = Vec::with_capacity(count);
    for i in 0..count {
        let start = (i * width).min(chars.len());
        let end = ((i + 1) * width).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        lines.push(pad_line(&chunk, width));
    }
    Some(lines)
}

/// Candidate fixed-width recoveries of a block without newlines, in format
/// detection order: 3×30 (TD1), 2×44 (TD3), 2×36 (TD2).
pub fn recover_lines(block: &str) -> Vec<Vec<String>> {
    [
        (3, TD1_LINE_LEN),
        (2, TD3_LINE_LEN),
        (2, TD2_LINE_LEN),
    ]
    .iter()
    .filter_map(|&(count, width)| split_fixed(block, count, width))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TD3_L1: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<";
    const TD3_L2: &str = "L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    #[test]
    fn test_sanitize_strips_and_uppercases() {
        assert_eq!(sanitize_line("p<uto eriksson!"), "P<UTOERIKSSON");
    }

    #[test]
    fn test_clean_keeps_two_longest_in_original_order() {
        let raw = format!("noise\n{TD3_L1}\n{TD3_L2}\nxx");
        let cleaned = clean_ocr_text(&raw);
        assert_eq!(cleaned, format!("{TD3_L1}\n{TD3_L2}"));
    }

    #[test]
    fn test_clean_takes_third_line_only_if_long() {
        let l3 = "ERIKSSON<<ANNA<MARIA<<<<<<<<<<";
        let raw = format!("I<UTOD231458907<<<<<<<<<<<<<<<\n7408122F1204159UTO<<<<<<<<<<<6\n{l3}");
        let cleaned = clean_ocr_text(&raw);
        assert_eq!(cleaned.lines().count(), 3);

        // A short third line with fillers qualifies as MRZ-ish but is not selected.
        let raw = format!("I<UTOD231458907<<<<<<<<<<<<<<<\n7408122F1204159UTO<<<<<<<<<<<6\nAB<<CD<<EF");
        let cleaned = clean_ocr_text(&raw);
        assert_eq!(cleaned.lines().count(), 2);
    }

    #[test]
    fn test_clean_collapses_when_no_line_structure() {
        let raw = "P<UTO ERIK\nSSON";
        let cleaned = clean_ocr_text(raw);
        assert!(!cleaned.contains('\n'));
        assert_eq!(cleaned, "P<UTOERIKSSON");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let inputs = [
            format!("{TD3_L1}\n{TD3_L2}"),
            "p<uto noise\nshort".to_string(),
            format!("junk!\n{TD3_L1}\n{TD3_L2}"),
        ];
        for raw in &inputs {
            let once = clean_ocr_text(raw);
            let twice = clean_ocr_text(&once);
            assert_eq!(once, twice, "clean not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_pad_line_idempotent_on_padded() {
        let padded = pad_line("ABC", 10);
        assert_eq!(padded, "ABC<<<<<<<");
        assert_eq!(pad_line(&padded, 10), padded);
    }

    #[test]
    fn test_recover_lines_splits_all_layouts() {
        let block: String = format!("{TD3_L1}{TD3_L2}");
        let candidates = recover_lines(&block);
        // 88 chars: splits as 3×30, 2×44, and 2×36 are all offered.
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[1], vec![TD3_L1.to_string(), TD3_L2.to_string()]);
        for (cand, width) in candidates.iter().zip([30usize, 44, 36]) {
            assert!(cand.iter().all(|l| l.len() == width));
        }
    }

    #[test]
    fn test_recover_lines_rejects_short_blocks() {
        assert!(recover_lines("ABCDEF").is_empty());
    }
}
