// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Score and Rendering Types
// ─────────────────────────────────────────────────────────────────────

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_score(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_score: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_score: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// Identifier of a semantic layer (its slug, e.g. `"l3"`).
///
/// The engine never enumerates layers itself; the universe comes from
/// whatever the dictionary snapshot references.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(slug: &str) -> Self {
        Self(slug.to_string())
    }
}

impl From<String> for LayerId {
    fn from(slug: String) -> Self {
        Self(slug)
    }
}

impl Borrow<str> for LayerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Half-open character range `[start, end)` of the normalized text
/// inside which ordinary term matches flip polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegationRange {
    pub start: usize,
    pub end: usize,
}

impl NegationRange {
    #[inline]
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end
    }
}

/// Per-layer score. One per known layer, present even when zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerScore {
    pub layer: LayerId,
    /// Signed accumulated evidence.
    pub raw_score: f64,
    /// Share of the positive mass, in [0, 1].
    pub normalized_score: f64,
    /// Surfaces that contributed, in first-match order, deduplicated.
    pub matched_terms: Vec<String>,
}

impl LayerScore {
    pub fn zero(layer: LayerId) -> Self {
        Self {
            layer,
            raw_score: 0.0,
            normalized_score: 0.0,
            matched_terms: Vec::new(),
        }
    }
}

/// A matched surface and the layer it was attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedTerm {
    pub term: String,
    pub layer: LayerId,
}

impl MatchedTerm {
    pub fn new(term: impl Into<String>, layer: impl Into<LayerId>) -> Self {
        Self {
            term: term.into(),
            layer: layer.into(),
        }
    }
}

/// Outcome of scoring one text. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Sorted by descending normalized score, canonical layer order on ties.
    pub scores: Vec<LayerScore>,
    pub dominant_layer: LayerId,
    pub crossover_degree: f64,
    /// Shannon entropy (bits) of the normalized scores.
    pub entropy: f64,
    pub decomposition_hints: Vec<String>,
    pub normalized_text: String,
}

impl AnalysisResult {
    /// Flatten per-layer matched sets into `(term, layer)` pairs, in
    /// score order, ready for highlighting.
    pub fn matched_terms(&self) -> Vec<MatchedTerm> {
        self.scores
            .iter()
            .flat_map(|s| {
                s.matched_terms
                    .iter()
                    .map(move |t| MatchedTerm::new(t.clone(), s.layer.clone()))
            })
            .collect()
    }

    pub fn score_of(&self, layer: &str) -> Option<&LayerScore> {
        self.scores.iter().find(|s| s.layer.as_str() == layer)
    }

    pub fn total_normalized(&self) -> f64 {
        self.scores.iter().map(|s| s.normalized_score).sum()
    }
}

/// Labeled (matched) or unlabeled (gap) substring. Offsets are in
/// characters of the highlighted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSpan {
    pub text: String,
    pub layer: Option<LayerId>,
    pub start: usize,
    pub end: usize,
}

impl HighlightSpan {
    pub fn is_labeled(&self) -> bool {
        self.layer.is_some()
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_nan() {
        assert_eq!(clamp_score(f64::NAN, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_clamp_pos_inf() {
        assert_eq!(clamp_score(f64::INFINITY, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_clamp_normal() {
        assert_eq!(clamp_score(0.75, 0.0, 1.0), 0.75);
    }

    #[test]
    fn test_layer_id_serde_transparent() {
        let id = LayerId::from("l3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"l3\"");
        let back: LayerId = serde_json::from_str("\"l4\"").unwrap();
        assert_eq!(back.as_str(), "l4");
    }

    #[test]
    fn test_negation_range_half_open() {
        let r = NegationRange { start: 2, end: 5 };
        assert!(!r.contains(1));
        assert!(r.contains(2));
        assert!(r.contains(4));
        assert!(!r.contains(5));
    }

    #[test]
    fn test_matched_terms_flatten_in_score_order() {
        let result = AnalysisResult {
            scores: vec![
                LayerScore {
                    layer: "l4".into(),
                    raw_score: 2.0,
                    normalized_score: 1.0,
                    matched_terms: vec!["批判".into(), "評判".into()],
                },
                LayerScore::zero("l3".into()),
            ],
            dominant_layer: "l4".into(),
            crossover_degree: 0.5,
            entropy: 0.0,
            decomposition_hints: vec![],
            normalized_text: String::new(),
        };
        let flat = result.matched_terms();
        assert_eq!(
            flat,
            vec![MatchedTerm::new("批判", "l4"), MatchedTerm::new("評判", "l4")]
        );
        assert!(result.score_of("l3").is_some());
        assert!((result.total_normalized() - 1.0).abs() < 1e-12);
    }
}
