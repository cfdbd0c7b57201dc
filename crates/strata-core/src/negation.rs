// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Negation Detector
// ─────────────────────────────────────────────────────────────────────
//! Derives negation windows from a cue lexicon.
//!
//! Every occurrence of every cue (overlapping ones included) yields the
//! range `[max(0, cue_start - window), cue_start + cue_len)`. Ranges are
//! neither merged nor sorted; membership is a linear scan, which is fine
//! for the bounded inputs the engine accepts.

use strata_types::NegationRange;

/// Find every occurrence of `needle` in `haystack` (both as chars),
/// restarting one character after each hit so overlaps are reported.
pub(crate) fn find_all(haystack: &[char], needle: &[char]) -> Vec<usize> {
    let mut hits = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() {
        return hits;
    }
    let mut pos = 0;
    while pos + needle.len() <= haystack.len() {
        if haystack[pos..].starts_with(needle) {
            hits.push(pos);
        }
        pos += 1;
    }
    hits
}

/// Detect negation ranges in already-normalized text.
pub fn detect_negation_ranges<S: AsRef<str>>(
    normalized: &str,
    cues: &[S],
    window: usize,
) -> Vec<NegationRange> {
    let chars: Vec<char> = normalized.chars().collect();
    detect_in_chars(&chars, cues, window)
}

pub(crate) fn detect_in_chars<S: AsRef<str>>(
    chars: &[char],
    cues: &[S],
    window: usize,
) -> Vec<NegationRange> {
    let mut ranges = Vec::new();
    for cue in cues {
        let cue: Vec<char> = cue.as_ref().chars().collect();
        for start in find_all(chars, &cue) {
            ranges.push(NegationRange {
                start: start.saturating_sub(window),
                end: start + cue.len(),
            });
        }
    }
    ranges
}

/// Whether `pos` lies inside any of `ranges`.
#[inline]
pub fn in_negation(pos: usize, ranges: &[NegationRange]) -> bool {
    ranges.iter().any(|r| r.contains(pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_types::DEFAULT_NEGATION_CUES;

    #[test]
    fn test_single_cue_window() {
        let ranges = detect_negation_ranges("責任ではない", &["ではない"], 5);
        assert_eq!(ranges, vec![NegationRange { start: 0, end: 6 }]);
    }

    #[test]
    fn test_window_clamped_at_zero() {
        let ranges = detect_negation_ranges("ない", &["ない"], 5);
        assert_eq!(ranges, vec![NegationRange { start: 0, end: 2 }]);
    }

    #[test]
    fn test_window_far_from_start() {
        // 0123456789
        // あいうえおかきくない
        let ranges = detect_negation_ranges("あいうえおかきくない", &["ない"], 5);
        assert_eq!(ranges, vec![NegationRange { start: 3, end: 10 }]);
        assert!(!in_negation(2, &ranges));
        assert!(in_negation(3, &ranges));
        assert!(!in_negation(10, &ranges));
    }

    #[test]
    fn test_overlapping_cues_not_merged() {
        // "ではない" also contains "ない"; both cues fire.
        let ranges = detect_negation_ranges("責任ではない", &["ない", "ではない"], 5);
        assert_eq!(ranges.len(), 2);
        assert!(ranges.contains(&NegationRange { start: 0, end: 6 }));
    }

    #[test]
    fn test_repeated_cue_each_occurrence() {
        let ranges = detect_negation_ranges("不安と不満", &["不"], 1);
        assert_eq!(
            ranges,
            vec![
                NegationRange { start: 0, end: 1 },
                NegationRange { start: 2, end: 4 },
            ]
        );
    }

    #[test]
    fn test_self_overlapping_occurrences() {
        let ranges = detect_negation_ranges("aaa", &["aa"], 0);
        assert_eq!(
            ranges,
            vec![
                NegationRange { start: 0, end: 2 },
                NegationRange { start: 1, end: 3 },
            ]
        );
    }

    #[test]
    fn test_no_cues_no_ranges() {
        let empty: [&str; 0] = [];
        assert!(detect_negation_ranges("ない", &empty, 5).is_empty());
        assert!(detect_negation_ranges("", &DEFAULT_NEGATION_CUES, 5).is_empty());
    }

    #[test]
    fn test_empty_cue_ignored() {
        assert!(detect_negation_ranges("abc", &[""], 5).is_empty());
    }
}
