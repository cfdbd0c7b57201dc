// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Highlight Span Builder
// ─────────────────────────────────────────────────────────────────────
//! Partitions a text into labeled (matched) and unlabeled (gap) spans.
//!
//! Every occurrence of every matched term becomes a candidate interval.
//! Candidates are ordered by start ascending, then end descending, and
//! selected greedily: an interval is kept only when it starts at or
//! after the end of the last kept one. Candidates identical in both
//! bounds keep their input order, so the earlier `(term, layer)` pair
//! wins.

use strata_types::{HighlightSpan, LayerId, MatchedTerm};

use crate::negation::find_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interval<'a> {
    start: usize,
    end: usize,
    layer: &'a LayerId,
}

fn collect_intervals<'a>(text: &[char], matched: &'a [MatchedTerm]) -> Vec<Interval<'a>> {
    let mut intervals = Vec::new();
    for m in matched {
        let needle: Vec<char> = m.term.chars().collect();
        for start in find_all(text, &needle) {
            intervals.push(Interval {
                start,
                end: start + needle.len(),
                layer: &m.layer,
            });
        }
    }
    intervals
}

fn select_non_overlapping(mut intervals: Vec<Interval<'_>>) -> Vec<Interval<'_>> {
    intervals.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    let mut covered = 0;
    let mut selected = Vec::with_capacity(intervals.len());
    for iv in intervals {
        if iv.start >= covered {
            covered = iv.end;
            selected.push(iv);
        }
    }
    selected
}

/// Build spans covering all of `text`. Offsets are character indices.
pub fn highlight_spans(text: &str, matched: &[MatchedTerm]) -> Vec<HighlightSpan> {
    let chars: Vec<char> = text.chars().collect();
    let selected = select_non_overlapping(collect_intervals(&chars, matched));

    let slice = |start: usize, end: usize| chars[start..end].iter().collect::<String>();
    let mut spans = Vec::with_capacity(selected.len() * 2 + 1);
    let mut pos = 0;
    for iv in &selected {
        if pos < iv.start {
            spans.push(HighlightSpan {
                text: slice(pos, iv.start),
                layer: None,
                start: pos,
                end: iv.start,
            });
        }
        spans.push(HighlightSpan {
            text: slice(iv.start, iv.end),
            layer: Some(iv.layer.clone()),
            start: iv.start,
            end: iv.end,
        });
        pos = iv.end;
    }
    if pos < chars.len() {
        spans.push(HighlightSpan {
            text: slice(pos, chars.len()),
            layer: None,
            start: pos,
            end: chars.len(),
        });
    }

    log::debug!(
        "highlight: {} candidate terms, {} labeled of {} spans",
        matched.len(),
        selected.len(),
        spans.len()
    );
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(spans: &[HighlightSpan]) -> Vec<(&str, Option<&str>)> {
        spans
            .iter()
            .map(|s| (s.text.as_str(), s.layer.as_ref().map(|l| l.as_str())))
            .collect()
    }

    #[test]
    fn test_gaps_and_matches() {
        let spans = highlight_spans(
            "責任を取らないことが批判された",
            &[MatchedTerm::new("批判", "l4"), MatchedTerm::new("責任", "l3")],
        );
        assert_eq!(
            labels(&spans),
            vec![
                ("責任", Some("l3")),
                ("を取らないことが", None),
                ("批判", Some("l4")),
                ("された", None),
            ]
        );
        assert_eq!(spans[2].start, 10);
        assert_eq!(spans[2].end, 12);
    }

    #[test]
    fn test_longer_wins_at_same_start() {
        let spans = highlight_spans(
            "愛情",
            &[MatchedTerm::new("愛", "a"), MatchedTerm::new("愛情", "b")],
        );
        assert_eq!(labels(&spans), vec![("愛情", Some("b"))]);
    }

    #[test]
    fn test_earlier_start_beats_longer_overlap() {
        // "abc" at 0 vs "bcdef" at 1: earliest start is kept.
        let spans = highlight_spans(
            "abcdef",
            &[MatchedTerm::new("bcdef", "y"), MatchedTerm::new("abc", "x")],
        );
        assert_eq!(labels(&spans), vec![("abc", Some("x")), ("def", None)]);
    }

    #[test]
    fn test_identical_interval_first_pair_wins() {
        let spans = highlight_spans(
            "規範",
            &[MatchedTerm::new("規範", "l4"), MatchedTerm::new("規範", "l5")],
        );
        assert_eq!(labels(&spans), vec![("規範", Some("l4"))]);
    }

    #[test]
    fn test_overlapping_occurrences_of_one_term() {
        let spans = highlight_spans("aaa", &[MatchedTerm::new("aa", "x")]);
        assert_eq!(labels(&spans), vec![("aa", Some("x")), ("a", None)]);
    }

    #[test]
    fn test_no_matches_single_gap() {
        let spans = highlight_spans("plain", &[]);
        assert_eq!(labels(&spans), vec![("plain", None)]);
    }

    #[test]
    fn test_empty_text() {
        assert!(highlight_spans("", &[MatchedTerm::new("a", "x")]).is_empty());
    }

    #[test]
    fn test_empty_term_ignored() {
        let spans = highlight_spans("ab", &[MatchedTerm::new("", "x")]);
        assert_eq!(labels(&spans), vec![("ab", None)]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn term_strategy() -> impl Strategy<Value = MatchedTerm> {
        ("[abc愛情]{0,3}", prop_oneof![Just("l0"), Just("l1"), Just("l2")])
            .prop_map(|(term, layer)| MatchedTerm::new(term, layer))
    }

    proptest! {
        /// Spans are ordered, contiguous, and concatenate to the input.
        #[test]
        fn spans_partition_text(
            text in "[abc愛情 ]{0,40}",
            matched in prop::collection::vec(term_strategy(), 0..6),
        ) {
            let spans = highlight_spans(&text, &matched);
            let rebuilt: String = spans.iter().map(|s| s.text.as_str()).collect();
            prop_assert_eq!(&rebuilt, &text);

            let mut pos = 0;
            for span in &spans {
                prop_assert_eq!(span.start, pos);
                prop_assert!(span.end > span.start);
                prop_assert_eq!(span.text.chars().count(), span.len());
                pos = span.end;
            }
            prop_assert_eq!(pos, text.chars().count());
        }
    }
}
