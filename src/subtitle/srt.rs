use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::Cue;

static SEQUENCE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2,}):(\d{2}):(\d{2}),(\d{3})").unwrap()
});

/// Uploaders' watermarks; cues containing any of these are dropped
const AD_MARKERS: &[&str] = &[
    "OpenSubtitles.org",
    "OpenSubtitles.com",
    "osdb.link",
    "Advertise your",
];

/// Parse SRT text into cues.
///
/// Blocks are separated by blank lines. Inside a block the first purely
/// numeric line opens the cue, the next line must be a `-->` timing line
/// and everything after it is text. Malformed blocks and advertisement
/// cues are skipped. Returns `None` when nothing usable remains.
pub fn parse(text: &str) -> Option<Vec<Cue>> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let normalized = normalized.strip_prefix('\u{FEFF}').unwrap_or(&normalized);

    let mut cues = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    for line in normalized.lines().map(str::trim) {
        if line.is_empty() {
            cues.extend(parse_block(&block, cues.len() + 1));
            block.clear();
        } else {
            block.push(line);
        }
    }
    cues.extend(parse_block(&block, cues.len() + 1));

    let total = cues.len();
    cues.retain(|cue| !AD_MARKERS.iter().any(|marker| cue.text.contains(marker)));
    if cues.len() < total {
        debug!("Dropped {} advertisement cue(s)", total - cues.len());
    }

    if cues.is_empty() {
        return None;
    }

    for (i, cue) in cues.iter_mut().enumerate() {
        cue.index = i + 1;
    }
    Some(cues)
}

fn parse_block(lines: &[&str], index: usize) -> Option<Cue> {
    let start = lines.iter().position(|line| SEQUENCE_LINE.is_match(line))?;
    let timing = lines.get(start + 1).filter(|line| line.contains("-->"))?;
    let text = lines[start + 2..].join("\n");
    if text.is_empty() {
        return None;
    }

    let (from, to) = timing.split_once("-->")?;
    Some(Cue::new(index, parse_srt_time(from), parse_srt_time(to), text))
}

/// Parse `HH:MM:SS,mmm` to milliseconds; malformed or out-of-range input
/// yields 0
pub fn parse_srt_time(value: &str) -> u64 {
    TIMESTAMP
        .captures(value)
        .and_then(|caps| timestamp_ms(&caps))
        .unwrap_or(0)
}

fn timestamp_ms(caps: &regex::Captures<'_>) -> Option<u64> {
    let field = |i: usize| caps[i].parse::<u64>().ok();
    field(1)?
        .checked_mul(3600)?
        .checked_add(field(2)? * 60 + field(3)?)?
        .checked_mul(1000)?
        .checked_add(field(4)?)
}

/// Format milliseconds as `HH:MM:SS,mmm`
pub fn format_srt_time(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Render cues as SRT, renumbering from 1
pub fn format(cues: &[Cue]) -> String {
    cues.iter()
        .enumerate()
        .map(|(i, cue)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                format_srt_time(cue.start_ms),
                format_srt_time(cue.end_ms),
                cue.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:03,000\nHello\n\n2\n00:00:04,500 --> 00:00:06,250\nTwo\nlines\n";

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0), "00:00:00,000");
        assert_eq!(format_srt_time(65_123), "00:01:05,123");
        assert_eq!(format_srt_time(3_661_500), "01:01:01,500");
    }

    #[test]
    fn test_parse_srt_time() {
        assert_eq!(parse_srt_time("00:00:01,000"), 1_000);
        assert_eq!(parse_srt_time(" 01:02:03,456 "), 3_723_456);
        assert_eq!(parse_srt_time("1:2:3"), 0);
        assert_eq!(parse_srt_time("garbage"), 0);
        assert_eq!(parse_srt_time("9999999999999999:00:00,000"), 0);
        assert_eq!(parse_srt_time("99999999999999999999999:00:00,000"), 0);
    }

    #[test]
    fn test_parse_basic() {
        let cues = parse(SAMPLE).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0], Cue::new(1, 1_000, 3_000, "Hello"));
        assert_eq!(cues[1].start_ms, 4_500);
        assert_eq!(cues[1].end_ms, 6_250);
        assert_eq!(cues[1].text, "Two\nlines");
    }

    #[test]
    fn test_parse_crlf_and_bom() {
        let text = format!("\u{FEFF}{}", SAMPLE.replace('\n', "\r\n"));
        let cues = parse(&text).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[1].text, "Two\nlines");
    }

    #[test]
    fn test_parse_skips_malformed_blocks() {
        let text = "1\nno timing here\nText\n\nx\n00:00:01,000 --> 00:00:02,000\nNot numbered\n\n3\n00:00:05,000 --> 00:00:06,000\n\n4\n00:00:07,000 --> 00:00:08,000\nKept\n";
        let cues = parse(text).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Kept");
        assert_eq!(cues[0].index, 1);
    }

    #[test]
    fn test_parse_ignores_sequence_number_value() {
        let text = "42\n00:00:01,000 --> 00:00:02,000\nFirst\n\n7\n00:00:03,000 --> 00:00:04,000\nSecond\n";
        let cues = parse(text).unwrap();
        assert_eq!(cues[0].index, 1);
        assert_eq!(cues[1].index, 2);
    }

    #[test]
    fn test_parse_filters_ads() {
        let text = "1\n00:00:00,500 --> 00:00:02,000\nSubtitles by OpenSubtitles.org\n\n2\n00:00:03,000 --> 00:00:04,000\nReal line\n\n3\n00:00:05,000 --> 00:00:06,000\nAdvertise your product here\n";
        let cues = parse(text).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Real line");
    }

    #[test]
    fn test_parse_returns_none_for_empty_or_ads_only() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("\n\n  \n"), None);
        assert_eq!(parse("1\n00:00:01,000 --> 00:00:02,000\nosdb.link/ad\n"), None);
    }

    #[test]
    fn test_malformed_timestamp_parses_to_zero() {
        let cues = parse("1\nbad --> 00:00:02,000\nText\n").unwrap();
        assert_eq!(cues[0].start_ms, 0);
        assert_eq!(cues[0].end_ms, 2_000);
    }

    #[test]
    fn test_huge_hours_parse_to_zero() {
        let cues = parse("1\n9999999999999999:00:00,000 --> 9999999999999999:00:01,000\nHuge\n").unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start_ms, 0);
        assert_eq!(cues[0].end_ms, 0);
        assert_eq!(cues[0].text, "Huge");
    }

    #[test]
    fn test_format_layout() {
        let cues = vec![
            Cue::new(9, 1_000, 3_000, "Hello"),
            Cue::new(3, 3_723_456, 3_724_000, "Bye"),
        ];
        assert_eq!(
            format(&cues),
            "1\n00:00:01,000 --> 00:00:03,000\nHello\n\n2\n01:02:03,456 --> 01:02:04,000\nBye\n"
        );
    }

    #[test]
    fn test_round_trip_preserves_timing_and_text() {
        let cues = vec![
            Cue::new(1, 0, 999, "Zero start"),
            Cue::new(2, 59_999, 61_001, "Across\na minute"),
            Cue::new(3, 360_000_000, 360_000_001, "Hundred hours"),
        ];
        let parsed = parse(&format(&cues)).unwrap();
        assert_eq!(parsed, cues);
    }
}
