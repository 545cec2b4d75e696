use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A legacy codepage the repair pass can try
#[derive(Debug, Clone, Copy)]
pub struct Codepage {
    pub encoding: &'static Encoding,
    pub description: &'static str,
}

/// Western-first order used when no language hint is available
const DEFAULT_ORDER: &[(&str, &str)] = &[
    ("windows-1252", "Windows-1252 (Western)"),
    ("windows-1251", "Windows-1251 (Cyrillic)"),
    ("windows-1253", "Windows-1253 (Greek)"),
    ("windows-1254", "Windows-1254 (Turkish)"),
    ("windows-1250", "Windows-1250 (Central European)"),
    ("windows-1255", "Windows-1255 (Hebrew)"),
    ("windows-1256", "Windows-1256 (Arabic)"),
    ("windows-874", "Windows-874 (Thai)"),
    ("windows-1258", "Windows-1258 (Vietnamese)"),
    ("windows-1257", "Windows-1257 (Baltic)"),
];

/// Preferred codepages per ISO 639-1 code, most likely first
const LANGUAGE_ORDER: &[(&str, &[&str])] = &[
    // Cyrillic
    ("ru", &["windows-1251", "koi8-r"]),
    ("uk", &["windows-1251", "koi8-u"]),
    ("bg", &["windows-1251"]),
    ("sr", &["windows-1251"]),
    ("mk", &["windows-1251"]),
    ("be", &["windows-1251"]),
    // Greek, Turkish, Hebrew, Arabic
    ("el", &["windows-1253", "iso-8859-7"]),
    ("tr", &["windows-1254", "iso-8859-9"]),
    ("he", &["windows-1255", "iso-8859-8"]),
    ("ar", &["windows-1256", "iso-8859-6"]),
    // Thai, Vietnamese
    ("th", &["windows-874", "tis-620"]),
    ("vi", &["windows-1258"]),
    // Central/Eastern European
    ("pl", &["windows-1250", "iso-8859-2"]),
    ("cs", &["windows-1250", "iso-8859-2"]),
    ("sk", &["windows-1250", "iso-8859-2"]),
    ("hu", &["windows-1250", "iso-8859-2"]),
    ("ro", &["windows-1250", "iso-8859-2"]),
    ("hr", &["windows-1250", "iso-8859-2"]),
    ("sl", &["windows-1250", "iso-8859-2"]),
    // Baltic
    ("lt", &["windows-1257"]),
    ("lv", &["windows-1257"]),
    ("et", &["windows-1257"]),
    // Western European
    ("de", &["windows-1252", "iso-8859-1"]),
    ("fr", &["windows-1252", "iso-8859-1"]),
    ("es", &["windows-1252", "iso-8859-1"]),
    ("it", &["windows-1252", "iso-8859-1"]),
    ("pt", &["windows-1252", "iso-8859-1"]),
    // CJK
    ("zh", &["gbk", "gb2312", "big5"]),
    ("ja", &["shift_jis", "euc-jp"]),
    ("ko", &["euc-kr", "cp949"]),
];

/// Legacy spellings seen in detector output and older tooling
const LABEL_ALIASES: &[(&str, &str)] = &[
    ("win874", "windows-874"),
    ("win1250", "windows-1250"),
    ("win1251", "windows-1251"),
    ("win1252", "windows-1252"),
    ("win1253", "windows-1253"),
    ("win1254", "windows-1254"),
    ("win1255", "windows-1255"),
    ("win1256", "windows-1256"),
    ("win1257", "windows-1257"),
    ("win1258", "windows-1258"),
    ("iso88591", "iso-8859-1"),
    ("iso88592", "iso-8859-2"),
    ("iso88596", "iso-8859-6"),
    ("iso88597", "iso-8859-7"),
    ("iso88598", "iso-8859-8"),
    ("iso88599", "iso-8859-9"),
    ("tis620", "tis-620"),
    ("cp949", "windows-949"),
    ("utf8", "utf-8"),
    ("utf16le", "utf-16le"),
    ("utf16be", "utf-16be"),
    ("ascii", "utf-8"),
    ("us-ascii", "utf-8"),
];

static DEFAULT_CODEPAGES: Lazy<Vec<Codepage>> = Lazy::new(|| {
    DEFAULT_ORDER
        .iter()
        .filter_map(|(label, description)| {
            decoder_for(label).map(|encoding| Codepage { encoding, description: *description })
        })
        .collect()
});

static LANGUAGE_CODEPAGES: Lazy<HashMap<&'static str, Vec<Codepage>>> = Lazy::new(|| {
    LANGUAGE_ORDER
        .iter()
        .map(|(lang, labels)| {
            let pages: Vec<Codepage> = labels
                .iter()
                .filter_map(|label| {
                    decoder_for(label).map(|encoding| Codepage {
                        encoding,
                        description: describe(*label),
                    })
                })
                .collect();
            (*lang, pages)
        })
        .collect()
});

fn describe(label: &'static str) -> &'static str {
    DEFAULT_ORDER
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, description)| *description)
        .unwrap_or(label)
}

/// Resolve an encoding name to a decoder, accepting legacy aliases.
///
/// Returns `None` for names neither `encoding_rs` nor the alias table knows.
pub fn decoder_for(name: &str) -> Option<&'static Encoding> {
    let lower = name.trim().to_ascii_lowercase();
    let label = LABEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(lower.as_str());
    Encoding::for_label(label.as_bytes())
}

/// Codepages to try for a 2-letter language hint.
///
/// The hinted language's pages come first, followed by the default list
/// without the ones already included.
pub fn prioritized_codepages(language_hint: Option<&str>) -> Vec<Codepage> {
    let preferred = language_hint
        .map(|hint| hint.to_ascii_lowercase())
        .and_then(|hint| LANGUAGE_CODEPAGES.get(hint.as_str()).cloned())
        .unwrap_or_default();

    if preferred.is_empty() {
        return DEFAULT_CODEPAGES.clone();
    }

    let mut pages = preferred;
    for page in DEFAULT_CODEPAGES.iter() {
        if !pages.iter().any(|p| p.encoding == page.encoding) {
            pages.push(*page);
        }
    }
    pages
}
