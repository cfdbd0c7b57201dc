// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Score Aggregator
// ─────────────────────────────────────────────────────────────────────
//! Turns raw accumulators into one normalized `LayerScore` per layer.
//!
//! `normalized = max(0, raw) / Σ max(0, raw)` when the positive mass is
//! non-zero, else 0 everywhere. Output is sorted by descending
//! normalized score with ties broken by canonical layer order, so the
//! result never depends on map iteration order.

use std::cmp::Ordering;

use strata_types::{clamp_score, LayerId, LayerScore};

use crate::matcher::LayerAccumulator;

/// Sum of the positive parts of the raw scores.
pub fn positive_mass(accumulators: &[LayerAccumulator]) -> f64 {
    accumulators.iter().map(|a| a.raw_score.max(0.0)).sum()
}

/// Build the sorted, deduplicated score list.
///
/// `universe` is every known layer in canonical order. Each appears
/// exactly once; a layer with hits keeps its scored entry, the rest get
/// zero placeholders. Accumulated layers missing from the universe are
/// appended after it.
pub fn aggregate(accumulators: &[LayerAccumulator], universe: &[LayerId]) -> Vec<LayerScore> {
    let total = positive_mass(accumulators);

    let mut order: Vec<&LayerId> = universe.iter().collect();
    for acc in accumulators {
        if !order.contains(&&acc.layer) {
            order.push(&acc.layer);
        }
    }

    let mut scores: Vec<(usize, LayerScore)> = Vec::with_capacity(order.len());
    for (rank, layer) in order.into_iter().enumerate() {
        if scores.iter().any(|(_, s)| &s.layer == layer) {
            continue;
        }
        let score = match accumulators.iter().find(|a| &a.layer == layer) {
            Some(acc) => LayerScore {
                layer: acc.layer.clone(),
                raw_score: acc.raw_score,
                normalized_score: if total > 0.0 {
                    clamp_score(acc.raw_score.max(0.0) / total, 0.0, 1.0)
                } else {
                    0.0
                },
                matched_terms: acc.matched_terms.clone(),
            },
            None => LayerScore::zero(layer.clone()),
        };
        scores.push((rank, score));
    }

    scores.sort_by(|(ra, a), (rb, b)| {
        b.normalized_score
            .partial_cmp(&a.normalized_score)
            .unwrap_or(Ordering::Equal)
            .then(ra.cmp(rb))
    });
    scores.into_iter().map(|(_, s)| s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc(layer: &str, raw: f64, terms: &[&str]) -> LayerAccumulator {
        LayerAccumulator {
            layer: layer.into(),
            raw_score: raw,
            matched_terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn ids(slugs: &[&str]) -> Vec<LayerId> {
        slugs.iter().map(|s| LayerId::from(*s)).collect()
    }

    #[test]
    fn test_normalizes_over_positive_mass() {
        let scores = aggregate(
            &[acc("a", 3.0, &["x"]), acc("b", 1.0, &["y"]), acc("c", -2.0, &["z"])],
            &ids(&["a", "b", "c"]),
        );
        assert_eq!(scores[0].layer.as_str(), "a");
        assert!((scores[0].normalized_score - 0.75).abs() < 1e-12);
        assert!((scores[1].normalized_score - 0.25).abs() < 1e-12);
        // Net-negative layer gets no share but keeps its raw score.
        assert_eq!(scores[2].normalized_score, 0.0);
        assert_eq!(scores[2].raw_score, -2.0);
    }

    #[test]
    fn test_zero_fill_every_known_layer_once() {
        let scores = aggregate(&[acc("l4", 1.3, &["批判"])], &ids(&["l0", "l3", "l4"]));
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0].layer.as_str(), "l4");
        assert_eq!(scores[0].matched_terms, vec!["批判".to_string()]);
        assert!(scores[1..].iter().all(|s| s.normalized_score == 0.0));
    }

    #[test]
    fn test_no_positive_mass_all_zero() {
        let scores = aggregate(&[acc("l3", -0.5, &["責任"])], &ids(&["l3", "l4"]));
        assert!(scores.iter().all(|s| s.normalized_score == 0.0));
        assert_eq!(scores[0].layer.as_str(), "l3");
    }

    #[test]
    fn test_ties_follow_canonical_order() {
        let scores = aggregate(
            &[acc("l5", 1.0, &[]), acc("l1", 1.0, &[])],
            &ids(&["l0", "l1", "l5"]),
        );
        let order: Vec<&str> = scores.iter().map(|s| s.layer.as_str()).collect();
        assert_eq!(order, vec!["l1", "l5", "l0"]);
    }

    #[test]
    fn test_accumulated_layer_outside_universe_appended() {
        let scores = aggregate(&[acc("stray", 1.0, &["q"])], &ids(&["l0"]));
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].layer.as_str(), "stray");
    }

    #[test]
    fn test_duplicate_universe_entries_dedup() {
        let scores = aggregate(&[acc("a", 1.0, &[])], &ids(&["a", "a", "b"]));
        assert_eq!(scores.len(), 2);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Σ normalized ∈ {0} ∪ [1 - 1e-9, 1 + 1e-9]
        #[test]
        fn normalized_sum_invariant(raws in prop::collection::vec(-5.0f64..5.0, 0..8)) {
            let accs: Vec<LayerAccumulator> = raws
                .iter()
                .enumerate()
                .map(|(i, &r)| LayerAccumulator {
                    layer: LayerId::new(format!("l{i}")),
                    raw_score: r,
                    matched_terms: Vec::new(),
                })
                .collect();
            let universe: Vec<LayerId> = accs.iter().map(|a| a.layer.clone()).collect();
            let scores = aggregate(&accs, &universe);
            prop_assert_eq!(scores.len(), universe.len());

            let sum: f64 = scores.iter().map(|s| s.normalized_score).sum();
            if raws.iter().any(|&r| r > 0.0) {
                prop_assert!((sum - 1.0).abs() < 1e-9, "sum = {}", sum);
            } else {
                prop_assert_eq!(sum, 0.0);
            }
            prop_assert!(scores.iter().all(|s| s.normalized_score >= 0.0));
            prop_assert!(scores
                .windows(2)
                .all(|w| w[0].normalized_score >= w[1].normalized_score));
        }
    }
}
