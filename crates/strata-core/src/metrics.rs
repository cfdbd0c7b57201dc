// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Metric Computer
// ─────────────────────────────────────────────────────────────────────
//! Dominant layer, crossover degree, entropy, and decomposition hints.
//!
//! All metrics are pure functions of a sorted score list, so recomputing
//! them from a stored `AnalysisResult.scores` reproduces the stored values.

use std::fmt;

use strata_types::{EngineConfig, HintLocale, LayerId, LayerScore};

/// Highest-share layer, or `fallback` when no layer is known.
/// Expects `scores` sorted by descending normalized score.
pub fn dominant_layer(scores: &[LayerScore], fallback: &str) -> LayerId {
    scores
        .first()
        .map(|s| s.layer.clone())
        .unwrap_or_else(|| LayerId::from(fallback))
}

/// Fraction of known layers whose share exceeds `threshold`.
pub fn crossover_degree(scores: &[LayerScore], threshold: f64) -> f64 {
    let active = scores
        .iter()
        .filter(|s| s.normalized_score > threshold)
        .count();
    active as f64 / scores.len().max(1) as f64
}

/// Shannon entropy in bits over layers with positive share.
pub fn entropy(scores: &[LayerScore]) -> f64 {
    scores
        .iter()
        .filter(|s| s.normalized_score > 0.0)
        .fold(0.0, |h, s| h - s.normalized_score * s.normalized_score.log2())
}

/// Rule-based reading aid attached to an analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecompositionHint {
    MultiLayerComposite,
    StronglyDominant(LayerId),
    NegationAdjusted,
}

impl DecompositionHint {
    pub fn render(&self, locale: HintLocale) -> String {
        match (self, locale) {
            (Self::MultiLayerComposite, HintLocale::En) => {
                "Multi-layer composite concept: decompose it layer by layer.".to_string()
            }
            (Self::MultiLayerComposite, HintLocale::Ja) => {
                "複数の層にまたがる複合概念です。層ごとに分解して検討してください。".to_string()
            }
            (Self::StronglyDominant(layer), HintLocale::En) => {
                format!("Layer {layer} is strongly dominant.")
            }
            (Self::StronglyDominant(layer), HintLocale::Ja) => {
                format!("この概念は{layer}の性質が強く支配的です。")
            }
            (Self::NegationAdjusted, HintLocale::En) => {
                "Negation present; scores adjusted.".to_string()
            }
            (Self::NegationAdjusted, HintLocale::Ja) => {
                "否定表現が含まれており、スコアが調整されています。".to_string()
            }
        }
    }
}

impl fmt::Display for DecompositionHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(HintLocale::En))
    }
}

/// Hints in fixed order: crossover, dominance, negation.
pub fn decomposition_hints(
    scores: &[LayerScore],
    crossover: f64,
    negation_detected: bool,
    config: &EngineConfig,
) -> Vec<DecompositionHint> {
    let mut hints = Vec::new();
    if crossover > config.composite_threshold {
        hints.push(DecompositionHint::MultiLayerComposite);
    }
    if let Some(top) = scores.first() {
        if top.normalized_score > config.dominance_threshold {
            hints.push(DecompositionHint::StronglyDominant(top.layer.clone()));
        }
    }
    if negation_detected {
        hints.push(DecompositionHint::NegationAdjusted);
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(layer: &str, p: f64) -> LayerScore {
        LayerScore {
            normalized_score: p,
            raw_score: p,
            ..LayerScore::zero(layer.into())
        }
    }

    #[test]
    fn test_single_layer_entropy_zero() {
        let scores = vec![score("l3", 1.0), score("l4", 0.0)];
        assert_eq!(entropy(&scores), 0.0);
    }

    #[test]
    fn test_uniform_entropy() {
        let scores = vec![score("a", 0.25), score("b", 0.25), score("c", 0.25), score("d", 0.25)];
        assert!((entropy(&scores) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_crossover_threshold_is_strict() {
        let scores = vec![score("a", 0.7), score("b", 0.15), score("c", 0.15)];
        assert!((crossover_degree(&scores, 0.15) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_crossover_empty() {
        assert_eq!(crossover_degree(&[], 0.15), 0.0);
    }

    #[test]
    fn test_dominant_fallback() {
        assert_eq!(dominant_layer(&[], "l0").as_str(), "l0");
        assert_eq!(dominant_layer(&[score("l2", 0.0)], "l0").as_str(), "l2");
    }

    #[test]
    fn test_hints_order_and_cooccurrence() {
        let config = EngineConfig::default();
        let scores = vec![score("a", 0.9), score("b", 0.1)];
        let hints = decomposition_hints(&scores, 0.75, true, &config);
        assert_eq!(
            hints,
            vec![
                DecompositionHint::MultiLayerComposite,
                DecompositionHint::StronglyDominant("a".into()),
                DecompositionHint::NegationAdjusted,
            ]
        );
    }

    #[test]
    fn test_hint_thresholds_strict() {
        let config = EngineConfig::default();
        let scores = vec![score("a", 0.8)];
        assert!(decomposition_hints(&scores, 0.5, false, &config).is_empty());
    }

    #[test]
    fn test_hint_render_locales() {
        let hint = DecompositionHint::StronglyDominant("l4".into());
        assert_eq!(hint.render(HintLocale::En), "Layer l4 is strongly dominant.");
        assert_eq!(hint.render(HintLocale::Ja), "この概念はl4の性質が強く支配的です。");
        assert_eq!(hint.to_string(), "Layer l4 is strongly dominant.");
    }

    #[test]
    fn test_metrics_idempotent_on_same_scores() {
        let scores = vec![score("a", 0.5), score("b", 0.3), score("c", 0.2)];
        assert_eq!(entropy(&scores), entropy(&scores.clone()));
        assert_eq!(
            crossover_degree(&scores, 0.15),
            crossover_degree(&scores.clone(), 0.15)
        );
    }
}
