// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! Strata layered concept scoring engine.

pub mod config;
pub mod error;
pub mod lexicon;
pub mod score;

pub use config::{EngineConfig, HintLocale, DEFAULT_NEGATION_CUES};
pub use error::{StrataError, StrataResult};
pub use lexicon::{DictionaryTerm, LayerDef, MappingOutcome, MappingRule};
pub use score::{
    clamp_score, AnalysisResult, HighlightSpan, LayerId, LayerScore, MatchedTerm, NegationRange,
};
