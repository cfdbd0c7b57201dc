// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Core Scoring Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Layered concept scoring: normalization, negation detection,
//! dictionary matching, aggregation, metrics, highlighting, and
//! mapping rule evaluation over versioned dictionary snapshots.
//!
//! # Invariants
//!
//! 1. **Deterministic**: identical text, dictionary, and config produce
//!    identical results, including score order and hint order.
//!
//! 2. **Shares sum to one or zero**: normalized scores are clamped to
//!    `[0, 1]` and sum to 1 when any layer has positive raw mass,
//!    otherwise every share is 0.
//!
//! 3. **Highlights partition the text**: spans are contiguous, ordered,
//!    and concatenate back to the input.
//!
//! 4. **Snapshots are immutable once published**: an analysis reads one
//!    snapshot from start to finish, whatever `reload` does meanwhile.

pub mod aggregate;
pub mod dictionary;
pub mod engine;
pub mod highlight;
pub mod mapping;
pub mod matcher;
pub mod metrics;
pub mod negation;
pub mod normalize;
pub mod snapshot;

pub use dictionary::Dictionary;
pub use engine::{apply_mapping_rules, highlight, score, score_with, Analysis, LayerEngine};
pub use mapping::{check_condition, Condition, ConditionCheck, ConditionPolicy};
pub use matcher::{ScanOutcome, TermHit};
pub use metrics::DecompositionHint;
pub use negation::detect_negation_ranges;
pub use normalize::normalize_text;
pub use snapshot::{cache_key, DictionarySnapshot, Snapshot, SnapshotStore};
