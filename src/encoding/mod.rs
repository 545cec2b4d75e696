// Subtitle text decoding
//
// Subtitle files arrive in whatever encoding their uploader's editor used:
// - BOM-marked UTF-8 / UTF-16 (including a UTF-16LE BOM that was itself
//   run through a Latin-1 -> UTF-8 conversion)
// - legacy codepages, found by statistical detection
// - UTF-8 that was mis-decoded once and saved again (double-encoding),
//   fixed by the repair pass

pub mod codepages;
pub mod repair;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use tracing::debug;

pub use codepages::{decoder_for, prioritized_codepages, Codepage};
pub use repair::{repair_double_encoding, signature_count};

use crate::language::to_two_letter;

/// Bytes fed to the charset detector
pub const DETECTION_SAMPLE_SIZE: usize = 1024;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];
/// `FF FE` after a Latin-1 -> UTF-8 round trip
const DOUBLE_ENCODED_UTF16LE_BOM: &[u8] = &[0xC3, 0xBF, 0xC3, 0xBE];

/// The UTF-8 BOM as it reads after a Latin-1 decode
const DOUBLE_ENCODED_BOM_TEXT: &str = "\u{00EF}\u{00BB}\u{00BF}";

/// Turn a raw subtitle buffer into text.
///
/// `language_hint` may be a 2- or 3-letter code; it only steers which
/// legacy codepages the repair pass tries first. Never fails: anything
/// undecodable ends up as lossy UTF-8.
pub fn normalize(buffer: &[u8], language_hint: Option<&str>) -> String {
    let hint = language_hint.and_then(to_two_letter);

    let decoded = decode_with_bom(buffer).unwrap_or_else(|| {
        let encoding = detect_encoding(buffer);
        debug!("No BOM found, decoding as {}", encoding.name());
        decode_lossy(encoding, buffer)
    });

    let text = repair_double_encoding(&decoded, hint.as_deref()).unwrap_or(decoded);
    strip_bom(text)
}

/// A dangling odd byte cannot form a UTF-16 code unit
fn whole_units(bytes: &[u8]) -> &[u8] {
    &bytes[..bytes.len() - bytes.len() % 2]
}

/// Decode according to a leading byte-order mark, if there is one
fn decode_with_bom(buffer: &[u8]) -> Option<String> {
    if buffer.starts_with(DOUBLE_ENCODED_UTF16LE_BOM) {
        debug!("Detected double-encoded UTF-16LE BOM");
        let (as_utf8, _) = UTF_8.decode_without_bom_handling(buffer);
        let undoubled: Vec<u8> = as_utf8.encode_utf16().map(|unit| unit as u8).collect();
        return Some(decode_lossy(UTF_16LE, whole_units(undoubled.get(2..).unwrap_or_default())));
    }
    if let Some(rest) = buffer.strip_prefix(UTF16LE_BOM) {
        debug!("Detected UTF-16LE BOM");
        return Some(decode_lossy(UTF_16LE, whole_units(rest)));
    }
    if let Some(rest) = buffer.strip_prefix(UTF16BE_BOM) {
        debug!("Detected UTF-16BE BOM");
        return Some(decode_lossy(UTF_16BE, whole_units(rest)));
    }
    if let Some(rest) = buffer.strip_prefix(UTF8_BOM) {
        debug!("Detected UTF-8 BOM");
        return Some(decode_lossy(UTF_8, rest));
    }
    None
}

/// Guess the charset of a BOM-less buffer.
///
/// Valid UTF-8 is taken as is; everything else goes through `chardetng`
/// on the first [`DETECTION_SAMPLE_SIZE`] bytes. Unsupported guesses fall
/// back to UTF-8.
pub fn detect_encoding(buffer: &[u8]) -> &'static Encoding {
    if std::str::from_utf8(buffer).is_ok() {
        return UTF_8;
    }

    let sample = &buffer[..buffer.len().min(DETECTION_SAMPLE_SIZE)];
    let mut detector = EncodingDetector::new();
    detector.feed(sample, sample.len() == buffer.len());
    let guess = detector.guess(None, true);

    decoder_for(guess.name()).unwrap_or(UTF_8)
}

fn decode_lossy(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        debug!("Malformed sequences replaced while decoding {}", encoding.name());
    }
    text.into_owned()
}

fn strip_bom(text: String) -> String {
    if let Some(rest) = text.strip_prefix('\u{FEFF}') {
        return rest.to_string();
    }
    if let Some(rest) = text.strip_prefix(DOUBLE_ENCODED_BOM_TEXT) {
        return rest.to_string();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16le_bom() {
        let buffer = [0xFF, 0xFE, b'H', 0x00, b'i', 0x00];
        assert_eq!(normalize(&buffer, None), "Hi");
    }

    #[test]
    fn test_utf16be_bom() {
        let buffer = [0xFE, 0xFF, 0x00, b'H', 0x00, b'i'];
        assert_eq!(normalize(&buffer, None), "Hi");
    }

    #[test]
    fn test_utf16be_ignores_trailing_odd_byte() {
        let buffer = [0xFE, 0xFF, 0x00, b'H', 0x00, b'i', 0x00];
        assert_eq!(normalize(&buffer, None), "Hi");
    }

    #[test]
    fn test_utf16le_ignores_trailing_odd_byte() {
        let buffer = [0xFF, 0xFE, b'H', 0x00, b'i', 0x00, 0x00];
        assert_eq!(normalize(&buffer, None), "Hi");

        let doubled = [0xC3, 0xBF, 0xC3, 0xBE, b'H', 0x00, b'i', 0x00, 0x00];
        assert_eq!(normalize(&doubled, None), "Hi");
    }

    #[test]
    fn test_double_encoded_utf16le_bom() {
        // FF FE 'H' 00 'i' 00 read as Latin-1 and saved as UTF-8
        let buffer = [0xC3, 0xBF, 0xC3, 0xBE, b'H', 0x00, b'i', 0x00];
        assert_eq!(normalize(&buffer, None), "Hi");
    }

    #[test]
    fn test_utf8_bom() {
        let mut buffer = UTF8_BOM.to_vec();
        buffer.extend_from_slice("Merhaba dünya".as_bytes());
        assert_eq!(normalize(&buffer, Some("tur")), "Merhaba dünya");
    }

    #[test]
    fn test_plain_utf8_passes_through() {
        let text = "1\n00:00:01,000 --> 00:00:02,000\nПривет\n";
        assert_eq!(normalize(text.as_bytes(), Some("rus")), text);
    }

    #[test]
    fn test_double_encoded_bom_text_is_stripped() {
        let text = format!("{}Hello", DOUBLE_ENCODED_BOM_TEXT);
        assert_eq!(normalize(text.as_bytes(), None), "Hello");
    }

    #[test]
    fn test_repairs_cyrillic_saved_as_latin1() {
        let original = "Привет! Как дела? Это проверка субтитров.";
        let latin1: String = original.bytes().map(|b| b as char).collect();
        assert_eq!(normalize(latin1.as_bytes(), Some("rus")), original);
    }

    #[test]
    fn test_detects_utf8_without_bom() {
        assert_eq!(detect_encoding("héllo".as_bytes()), UTF_8);
    }

    #[test]
    fn test_legacy_bytes_never_panic() {
        let buffer: Vec<u8> = (0x80..=0xFF).chain(b"\nplain ascii tail\n".iter().copied()).collect();
        let text = normalize(&buffer, Some("el"));
        assert!(text.ends_with("plain ascii tail\n"));
    }
}
