//! Language metadata for the subtitle source.
//!
//! The source identifies languages with its own 3-letter codes (mostly
//! ISO 639-2/B, plus a few house codes such as `pob`, `zht` and `scc`).
//! Encoding hints need ISO 639-1 codes, so this module maps between them.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static LANGUAGE_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("afr", "Afrikaans"),
        ("alb", "Albanian"),
        ("ara", "Arabic"),
        ("arm", "Armenian"),
        ("aze", "Azerbaijani"),
        ("baq", "Basque"),
        ("bel", "Belarusian"),
        ("ben", "Bengali"),
        ("bos", "Bosnian"),
        ("bre", "Breton"),
        ("bul", "Bulgarian"),
        ("bur", "Burmese"),
        ("cat", "Catalan"),
        ("chi", "Chinese (Simplified)"),
        ("zht", "Chinese (Traditional)"),
        ("hrv", "Croatian"),
        ("cze", "Czech"),
        ("dan", "Danish"),
        ("dut", "Dutch"),
        ("eng", "English"),
        ("epo", "Esperanto"),
        ("est", "Estonian"),
        ("fin", "Finnish"),
        ("fre", "French"),
        ("geo", "Georgian"),
        ("ger", "German"),
        ("ell", "Greek"),
        ("heb", "Hebrew"),
        ("hin", "Hindi"),
        ("hun", "Hungarian"),
        ("ice", "Icelandic"),
        ("ind", "Indonesian"),
        ("gle", "Irish"),
        ("ita", "Italian"),
        ("jpn", "Japanese"),
        ("kan", "Kannada"),
        ("kaz", "Kazakh"),
        ("khm", "Khmer"),
        ("kor", "Korean"),
        ("kur", "Kurdish"),
        ("lav", "Latvian"),
        ("lit", "Lithuanian"),
        ("ltz", "Luxembourgish"),
        ("mac", "Macedonian"),
        ("may", "Malay"),
        ("mal", "Malayalam"),
        ("mlt", "Maltese"),
        ("mar", "Marathi"),
        ("mon", "Mongolian"),
        ("nep", "Nepali"),
        ("nor", "Norwegian"),
        ("per", "Persian"),
        ("pol", "Polish"),
        ("por", "Portuguese"),
        ("pob", "Portuguese (Brazil)"),
        ("rum", "Romanian"),
        ("rus", "Russian"),
        ("scc", "Serbian"),
        ("sin", "Sinhala"),
        ("slo", "Slovak"),
        ("slv", "Slovenian"),
        ("som", "Somali"),
        ("spa", "Spanish"),
        ("spl", "Spanish (Latin America)"),
        ("swa", "Swahili"),
        ("swe", "Swedish"),
        ("tgl", "Tagalog"),
        ("tam", "Tamil"),
        ("tel", "Telugu"),
        ("tha", "Thai"),
        ("tur", "Turkish"),
        ("ukr", "Ukrainian"),
        ("urd", "Urdu"),
        ("uzb", "Uzbek"),
        ("vie", "Vietnamese"),
        ("wel", "Welsh"),
    ])
});

/// Shown first in the language picker, in this order
const POPULAR_LANGUAGES: &[&str] = &[
    "eng", "spa", "fre", "ger", "ita", "por", "pob", "rus", "tur",
    "ara", "jpn", "kor", "chi", "zht", "hin", "dut", "pol", "swe",
    "dan", "nor", "fin", "ell", "cze", "hun", "rum", "ukr", "vie",
    "tha", "ind", "heb", "per", "bul", "hrv", "scc", "slo", "slv",
];

static THREE_TO_TWO: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // Major world languages
        ("ara", "ar"), ("chi", "zh"), ("zho", "zh"), ("eng", "en"),
        ("fre", "fr"), ("fra", "fr"), ("ger", "de"), ("deu", "de"),
        ("hin", "hi"), ("ita", "it"), ("jpn", "ja"), ("kor", "ko"),
        ("por", "pt"), ("rus", "ru"), ("spa", "es"), ("tur", "tr"),
        // European
        ("alb", "sq"), ("sqi", "sq"), ("arm", "hy"), ("hye", "hy"),
        ("aze", "az"), ("baq", "eu"), ("eus", "eu"), ("bel", "be"),
        ("bos", "bs"), ("bul", "bg"), ("cat", "ca"), ("cze", "cs"),
        ("ces", "cs"), ("dan", "da"), ("dut", "nl"), ("nld", "nl"),
        ("ell", "el"), ("gre", "el"), ("est", "et"), ("fin", "fi"),
        ("geo", "ka"), ("kat", "ka"), ("hrv", "hr"), ("hun", "hu"),
        ("ice", "is"), ("isl", "is"), ("lav", "lv"), ("lit", "lt"),
        ("mac", "mk"), ("mkd", "mk"), ("nor", "no"), ("nob", "no"),
        ("pol", "pl"), ("rum", "ro"), ("ron", "ro"), ("scc", "sr"),
        ("srp", "sr"), ("slo", "sk"), ("slk", "sk"), ("slv", "sl"),
        ("swe", "sv"), ("ukr", "uk"), ("wel", "cy"), ("cym", "cy"),
        // Middle Eastern
        ("heb", "he"), ("per", "fa"), ("fas", "fa"), ("urd", "ur"),
        // Asian
        ("ben", "bn"), ("tha", "th"), ("vie", "vi"), ("ind", "id"),
        ("may", "ms"), ("msa", "ms"), ("tgl", "tl"),
        // House variants
        ("zht", "zh"), ("zhc", "zh"),
        ("pob", "pt"), ("pom", "pt"), ("spl", "es"), ("spn", "es"),
    ])
});

/// Bibliographic/terminological pairs the source uses interchangeably
const ALIAS_PAIRS: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("per", "fas"),
    ("mac", "mkd"),
    ("ice", "isl"),
    ("scc", "srp"),
];

static SELECTOR_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+)\]$").expect("selector pattern is valid")
});

/// Display name for a source language code, or the code itself
pub fn language_name(code: &str) -> &str {
    LANGUAGE_NAMES.get(code).copied().unwrap_or(code)
}

/// Extract the code from a configured selector like `"English [eng]"`.
///
/// Values without a trailing `[code]` are returned trimmed but otherwise
/// unchanged, so plain codes work as selectors too.
pub fn parse_lang_code(selector: &str) -> String {
    let selector = selector.trim();
    match SELECTOR_CODE.captures(selector) {
        Some(caps) => caps[1].trim().to_string(),
        None => selector.to_string(),
    }
}

/// Map a 2- or 3-letter code to ISO 639-1, as used for encoding hints
pub fn to_two_letter(code: &str) -> Option<String> {
    let lower = code.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    if lower.len() == 2 {
        return Some(lower);
    }
    THREE_TO_TWO.get(lower.as_str()).map(|c| c.to_string())
}

/// Every code the source may use for the same language, the given one first
pub fn language_aliases(code: &str) -> Vec<String> {
    for (a, b) in ALIAS_PAIRS {
        if code == *a {
            return vec![a.to_string(), b.to_string()];
        }
        if code == *b {
            return vec![b.to_string(), a.to_string()];
        }
    }
    vec![code.to_string()]
}

/// Selector strings for every known language: popular first, rest by name
pub fn language_options() -> Vec<String> {
    let mut others: Vec<(&str, &str)> = LANGUAGE_NAMES
        .iter()
        .filter(|(code, _)| !POPULAR_LANGUAGES.contains(*code))
        .map(|(code, name)| (*code, *name))
        .collect();
    others.sort_by(|a, b| a.1.cmp(b.1));

    POPULAR_LANGUAGES
        .iter()
        .filter_map(|code| LANGUAGE_NAMES.get(code).map(|name| (*code, *name)))
        .chain(others)
        .map(|(code, name)| format!("{} [{}]", name, code))
        .collect()
}
