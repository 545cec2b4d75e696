//! Streaming greedy alignment of two cue sequences.
//!
//! Both sequences are expected in ascending start order. Each primary cue is
//! matched to at most one secondary cue; earlier decisions are never
//! revisited, which keeps the scan close to linear for real subtitle tracks.
//! A secondary cue can still be picked by more than one primary cue when
//! their spans overlap.

use crate::subtitle::Cue;

pub const DEFAULT_THRESHOLD_MS: u64 = 500;

/// For every primary cue, the position of its matching secondary cue.
///
/// A secondary cue is a candidate when it starts or ends inside the primary
/// span, is contained in or contains that span, or starts less than
/// `threshold_ms` away from the primary start. The candidate with the
/// closest start wins; on ties the first one scanned.
pub fn align(primary: &[Cue], secondary: &[Cue], threshold_ms: u64) -> Vec<Option<usize>> {
    let threshold = signed(threshold_ms);
    let mut cursor = 0usize;

    primary
        .iter()
        .map(|p| {
            let (ps, pe) = (signed(p.start_ms), signed(p.end_ms));
            let mut best: Option<(usize, i64)> = None;

            for (i, s) in secondary.iter().enumerate().skip(cursor) {
                let (ss, se) = (signed(s.start_ms), signed(s.end_ms));
                let diff = (ps - ss).abs();

                let starts_inside = ss >= ps && ss < pe;
                let ends_inside = se > ps && se <= pe;
                let within = ss >= ps && se <= pe;
                let contains = ss < ps && se > pe;

                if starts_inside || ends_inside || within || contains || diff < threshold {
                    if best.is_none_or(|(_, smallest)| diff < smallest) {
                        best = Some((i, diff));
                    }
                } else if ss > pe.saturating_add(threshold) {
                    break;
                }

                // Only the cue at the cursor may move it forward
                if i == cursor && se < ps.saturating_sub(threshold.saturating_mul(2)) {
                    cursor = i + 1;
                }
            }

            best.map(|(i, _)| i)
        })
        .collect()
}

/// Milliseconds beyond `i64::MAX` saturate
fn signed(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}
