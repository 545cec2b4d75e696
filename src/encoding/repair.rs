use encoding_rs::UTF_8;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::codepages::prioritized_codepages;

/// More signature hits than this triggers a repair attempt
const REPAIR_TRIGGER: usize = 10;

/// A repaired candidate must keep fewer than 1/5 of the original hits
const ACCEPT_DIVISOR: usize = 5;

/// UTF-8 lead/continuation byte pairs as they look after a single-byte
/// Western decode. Each hit is one mis-decoded multi-byte character.
static SIGNATURES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("thai/cjk", r"[\u{00E0}-\u{00EF}][\u{0080}-\u{00BF}]"),
        ("accented", r"\u{00C3}[\u{0080}-\u{00BF}]"),
        ("special", r"\u{00C2}[\u{0080}-\u{00BF}]"),
        ("cyrillic", r"[\u{00D0}-\u{00D4}][\u{0080}-\u{00BF}]"),
        ("greek", r"[\u{00CC}-\u{00CF}][\u{0080}-\u{00BF}]"),
        ("hebrew", r"\u{00D7}[\u{0080}-\u{00BF}]"),
        ("arabic", r"[\u{00D8}-\u{00DB}][\u{0080}-\u{00BF}]"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("signature pattern is valid")))
    .collect()
});

/// Total signature hits, summed over every pattern
pub fn signature_count(text: &str) -> usize {
    SIGNATURES
        .iter()
        .map(|(_, pattern)| pattern.find_iter(text).count())
        .sum()
}

/// Undo a UTF-8-as-Latin-1 (or legacy codepage) mis-decode.
///
/// Returns `None` when the text does not look double-encoded or when no
/// reinterpretation removes at least 80% of the signature hits.
pub fn repair_double_encoding(text: &str, language_hint: Option<&str>) -> Option<String> {
    let total = signature_count(text);
    if total <= REPAIR_TRIGGER {
        return None;
    }

    debug!("Found {} double-encoding signatures, attempting repair", total);

    // Low byte of every code unit, which is what the mis-decode produced
    let bytes: Vec<u8> = text.encode_utf16().map(|unit| unit as u8).collect();

    let (utf8, _) = UTF_8.decode_without_bom_handling(&bytes);
    if accepts(&utf8, total) {
        debug!("Repaired double-encoded UTF-8");
        return Some(utf8.into_owned());
    }

    for codepage in prioritized_codepages(language_hint) {
        let (decoded, _) = codepage.encoding.decode_without_bom_handling(&bytes);
        if accepts(&decoded, total) {
            debug!("Repaired text using {}", codepage.description);
            return Some(decoded.into_owned());
        }
    }

    debug!("No repair strategy reduced the signature count");
    None
}

fn accepts(candidate: &str, original_total: usize) -> bool {
    !candidate.contains('\u{FFFD}') && signature_count(candidate) * ACCEPT_DIVISOR < original_total
}
