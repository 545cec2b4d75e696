// Subtitle data model
//
// - srt: SRT text <-> cue sequence
// - clean: markup stripping used when composing bilingual cues

pub mod clean;
pub mod srt;

use serde::{Deserialize, Serialize};

pub use clean::clean_text;
pub use srt::{format, format_srt_time, parse, parse_srt_time};

/// One timed subtitle entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cue {
    /// Display position, 1-based; renumbered when formatted
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    /// May span several lines
    pub text: String,
}

impl Cue {
    /// Build a cue, clamping `end_ms` so it never precedes `start_ms`
    pub fn new(index: usize, start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            index,
            start_ms,
            end_ms: end_ms.max(start_ms),
            text: text.into(),
        }
    }

    /// Same timing, different text
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            index: self.index,
            start_ms: self.start_ms,
            end_ms: self.end_ms,
            text: text.into(),
        }
    }
}
