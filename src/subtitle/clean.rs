use once_cell::sync::Lazy;
use regex::Regex;

/// HTML-ish tags such as `<i>`, `</font>`, `<b></b>`
static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// SSA/ASS override blocks such as `{\an8}` or `{\i1}`
static OVERRIDE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\\[^}]*\}").unwrap());

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\n|\r").unwrap());

/// Strip markup and flatten a cue's text onto a single line.
///
/// An empty result means the cue carried nothing but formatting.
pub fn clean_text(text: &str) -> String {
    let without_tags = MARKUP_TAG.replace_all(text, "");
    let without_overrides = OVERRIDE_BLOCK.replace_all(&without_tags, "");
    LINE_BREAK
        .replace_all(&without_overrides, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_is_idempotent_on_clean_input() {
        assert_eq!(clean_text("Hello there"), "Hello there");
        assert_eq!(clean_text(&clean_text("Hello there")), "Hello there");
    }

    #[test]
    fn test_strips_tags() {
        assert_eq!(clean_text("<i>Hello</i> <font color=\"red\">world</font>"), "Hello world");
    }

    #[test]
    fn test_strips_override_blocks() {
        assert_eq!(clean_text("{\\an8}Top line"), "Top line");
    }

    #[test]
    fn test_collapses_line_breaks() {
        assert_eq!(clean_text("First line\nsecond line\r\nthird\rfourth"), "First line second line third fourth");
    }

    #[test]
    fn test_markup_only_becomes_empty() {
        assert_eq!(clean_text("<b></b>"), "");
        assert_eq!(clean_text("  <i>\n</i>  "), "");
    }
}
