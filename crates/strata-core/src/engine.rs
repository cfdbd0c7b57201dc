// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Scoring Engine
// ─────────────────────────────────────────────────────────────────────
//! Pipeline wiring and the call-boundary facade.
//!
//! Normalizer → negation detector → matcher → aggregator → metrics, with
//! the highlight builder and mapping rules as independent passes over
//! the results. The free functions are total; `LayerEngine` adds input
//! validation, a validated config, and a hot-swappable snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use strata_types::{
    AnalysisResult, DictionaryTerm, EngineConfig, HighlightSpan, LayerId, LayerScore,
    MappingOutcome, MappingRule, MatchedTerm, StrataError, StrataResult,
};

use crate::aggregate::aggregate;
use crate::dictionary::Dictionary;
use crate::highlight::highlight_spans;
use crate::mapping::{evaluate_rules, ConditionPolicy};
use crate::matcher::scan;
use crate::metrics::{crossover_degree, decomposition_hints, dominant_layer, entropy};
use crate::negation::detect_in_chars;
use crate::normalize::{is_space, normalize_text};
use crate::snapshot::{cache_key, DictionarySnapshot, Snapshot, SnapshotStore};

/// Fewest and most texts `compare` accepts.
pub const COMPARE_MIN: usize = 2;
pub const COMPARE_MAX: usize = 5;

/// Score text against a term list with the default configuration.
pub fn score(text: &str, dictionary: &[DictionaryTerm]) -> AnalysisResult {
    score_with(text, &Dictionary::from_terms(dictionary), &EngineConfig::default())
}

/// Highlight every occurrence of the matched terms in `text`.
pub fn highlight(text: &str, matched: &[MatchedTerm]) -> Vec<HighlightSpan> {
    highlight_spans(text, matched)
}

/// Evaluate the `(from, to)` rules with the lenient condition policy.
pub fn apply_mapping_rules(
    rules: &[MappingRule],
    scores: &[LayerScore],
    from: &LayerId,
    to: &LayerId,
) -> Vec<MappingOutcome> {
    evaluate_rules(rules, scores, from, to, ConditionPolicy::Lenient)
}

/// Run the scoring pipeline with an explicit dictionary and config.
pub fn score_with(text: &str, dictionary: &Dictionary, config: &EngineConfig) -> AnalysisResult {
    let normalized = normalize_text(text);
    let chars: Vec<char> = normalized.chars().collect();
    let negations = detect_in_chars(&chars, &config.negation_cues, config.negation_window);
    let outcome = scan(&chars, dictionary, &negations, config);

    let scores = aggregate(&outcome.accumulators, dictionary.layers());
    let dominant = dominant_layer(&scores, &config.fallback_layer);
    let crossover = crossover_degree(&scores, config.activation_threshold);
    let entropy = entropy(&scores);
    let hints = decomposition_hints(&scores, crossover, !negations.is_empty(), config)
        .iter()
        .map(|h| h.render(config.hint_locale))
        .collect();

    log::debug!(
        "score: dominant={dominant} crossover={crossover:.3} entropy={entropy:.3} negations={}",
        negations.len()
    );

    AnalysisResult {
        scores,
        dominant_layer: dominant,
        crossover_degree: crossover,
        entropy,
        decomposition_hints: hints,
        normalized_text: normalized,
    }
}

/// Full analysis of one text: scores, highlights, and its cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub result: AnalysisResult,
    /// Spans over the caller's text, as submitted.
    pub highlights: Vec<HighlightSpan>,
    /// Spans over `result.normalized_text`.
    pub normalized_highlights: Vec<HighlightSpan>,
    pub snapshot_version: String,
    pub cache_key: String,
}

/// Long-lived engine bound to a config and a snapshot store.
///
/// Thread-safe: scoring is read-only; snapshot swaps go through the
/// store's `RwLock` and never affect an analysis already in flight.
pub struct LayerEngine {
    config: EngineConfig,
    store: SnapshotStore,
}

impl LayerEngine {
    pub fn new(config: EngineConfig, snapshot: DictionarySnapshot) -> StrataResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: SnapshotStore::new(snapshot)?,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.current()
    }

    /// Validate and publish a new snapshot version.
    pub fn reload(&self, snapshot: DictionarySnapshot) -> StrataResult<()> {
        self.store.publish(snapshot).map(|_| ())
    }

    fn policy(&self) -> ConditionPolicy {
        ConditionPolicy::from_strict(self.config.strict_conditions)
    }

    fn check_input(&self, text: &str) -> StrataResult<()> {
        if text.chars().all(is_space) {
            return Err(StrataError::Validation("text must not be blank".to_string()));
        }
        let len = text.chars().count();
        if len > self.config.max_input_chars {
            return Err(StrataError::Validation(format!(
                "text has {len} characters, limit is {}",
                self.config.max_input_chars
            )));
        }
        Ok(())
    }

    /// Score without boundary checks. Total.
    pub fn score(&self, text: &str) -> AnalysisResult {
        score_with(text, self.snapshot().dictionary(), &self.config)
    }

    pub fn highlight(&self, text: &str, matched: &[MatchedTerm]) -> Vec<HighlightSpan> {
        highlight_spans(text, matched)
    }

    /// Evaluate the current snapshot's rules for `(from, to)`.
    pub fn apply_mapping_rules(
        &self,
        scores: &[LayerScore],
        from: &LayerId,
        to: &LayerId,
    ) -> Vec<MappingOutcome> {
        evaluate_rules(self.snapshot().rules(), scores, from, to, self.policy())
    }

    /// Validate, score, and highlight one text against one snapshot.
    pub fn analyze(&self, text: &str) -> StrataResult<Analysis> {
        self.check_input(text)?;
        let snapshot = self.snapshot();
        let result = score_with(text, snapshot.dictionary(), &self.config);
        let matched = result.matched_terms();
        let highlights = highlight_spans(text, &matched);
        let normalized_highlights = highlight_spans(&result.normalized_text, &matched);
        Ok(Analysis {
            cache_key: cache_key(text, snapshot.fingerprint()),
            snapshot_version: snapshot.version().to_string(),
            highlights,
            normalized_highlights,
            result,
        })
    }

    /// Score `text`, then evaluate the `(from, to)` rules on its scores.
    pub fn map(&self, text: &str, from: &LayerId, to: &LayerId) -> StrataResult<Vec<MappingOutcome>> {
        self.check_input(text)?;
        let snapshot = self.snapshot();
        let result = score_with(text, snapshot.dictionary(), &self.config);
        Ok(evaluate_rules(
            snapshot.rules(),
            &result.scores,
            from,
            to,
            self.policy(),
        ))
    }

    /// Score several texts against the same snapshot.
    pub fn compare(&self, texts: &[&str]) -> StrataResult<Vec<AnalysisResult>> {
        if !(COMPARE_MIN..=COMPARE_MAX).contains(&texts.len()) {
            return Err(StrataError::Validation(format!(
                "compare takes {COMPARE_MIN} to {COMPARE_MAX} texts, got {}",
                texts.len()
            )));
        }
        for text in texts {
            self.check_input(text)?;
        }
        let snapshot = self.snapshot();
        Ok(texts
            .iter()
            .map(|t| score_with(t, snapshot.dictionary(), &self.config))
            .collect())
    }
}
