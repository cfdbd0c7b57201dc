// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Engine Configuration
// ─────────────────────────────────────────────────────────────────────

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StrataError, StrataResult};

/// Default negation cue lexicon (Japanese negative forms and words).
pub const DEFAULT_NEGATION_CUES: [&str; 17] = [
    "ない",
    "なく",
    "なかった",
    "ではない",
    "でない",
    "しない",
    "しなかった",
    "ません",
    "ませんでした",
    "否定",
    "違う",
    "異なる",
    "反する",
    "排除",
    "除外",
    "無い",
    "不",
];

/// Language used to render decomposition hints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintLocale {
    #[default]
    En,
    Ja,
}

impl fmt::Display for HintLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HintLocale::En => f.write_str("en"),
            HintLocale::Ja => f.write_str("ja"),
        }
    }
}

/// Runtime configuration for the scoring pipeline.
///
/// Every constant the pipeline depends on lives here so that two runs
/// with equal configs and equal snapshots are bit-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Literal substrings that open a negation window.
    pub negation_cues: Vec<String>,

    /// Characters before a cue that fall inside its window.
    /// Default: 5.
    pub negation_window: usize,

    /// Multiplier applied to ordinary terms inside a negation window.
    /// Default: -0.5.
    pub negation_polarity: f64,

    /// Lookahead (characters) for the bigram/unigram fallback.
    /// Default: 4.
    pub ngram_window: usize,

    /// Extra multiplier on fallback n-gram contributions.
    /// Default: 0.5.
    pub ngram_penalty: f64,

    /// A layer counts towards crossover when its share exceeds this.
    /// Default: 0.15.
    pub activation_threshold: f64,

    /// Crossover degree above which the composite hint is emitted.
    /// Default: 0.5.
    pub composite_threshold: f64,

    /// Top share above which the dominance hint is emitted.
    /// Default: 0.8.
    pub dominance_threshold: f64,

    /// Dominant layer reported when no layer is known at all.
    pub fallback_layer: String,

    /// Upper bound on input length (characters) at the call boundary.
    /// Default: 5000.
    pub max_input_chars: usize,

    /// Malformed mapping conditions fail closed instead of open.
    pub strict_conditions: bool,

    pub hint_locale: HintLocale,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            negation_cues: DEFAULT_NEGATION_CUES.iter().map(|c| c.to_string()).collect(),
            negation_window: 5,
            negation_polarity: -0.5,
            ngram_window: 4,
            ngram_penalty: 0.5,
            activation_threshold: 0.15,
            composite_threshold: 0.5,
            dominance_threshold: 0.8,
            fallback_layer: "l0".to_string(),
            max_input_chars: 5000,
            strict_conditions: false,
            hint_locale: HintLocale::En,
        }
    }
}

impl EngineConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> StrataResult<()> {
        if let Some(i) = self.negation_cues.iter().position(|c| c.is_empty()) {
            return Err(StrataError::Config(format!(
                "negation_cues[{i}] must not be empty"
            )));
        }
        for (name, value) in [
            ("activation_threshold", self.activation_threshold),
            ("composite_threshold", self.composite_threshold),
            ("dominance_threshold", self.dominance_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(StrataError::Config(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        if !self.negation_polarity.is_finite() || self.negation_polarity >= 0.0 {
            return Err(StrataError::Config(format!(
                "negation_polarity must be finite and < 0, got {}",
                self.negation_polarity
            )));
        }
        if !(self.ngram_penalty > 0.0 && self.ngram_penalty <= 1.0) {
            return Err(StrataError::Config(format!(
                "ngram_penalty must be in (0, 1], got {}",
                self.ngram_penalty
            )));
        }
        if self.ngram_window == 0 {
            return Err(StrataError::Config("ngram_window must be > 0".to_string()));
        }
        if self.max_input_chars == 0 {
            return Err(StrataError::Config(
                "max_input_chars must be > 0".to_string(),
            ));
        }
        if self.fallback_layer.trim().is_empty() {
            return Err(StrataError::Config(
                "fallback_layer must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> StrataResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| StrataError::Config(format!("JSON parse error: {e}")))
    }
}
