// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Dictionary and Mapping Rule Types
// ─────────────────────────────────────────────────────────────────────
//! Read-only inputs owned by the external dictionary/rule store.

use serde::{Deserialize, Serialize};

use crate::score::LayerId;

/// A weighted literal surface attributed to one layer.
///
/// Duplicates are allowed. The literal scan credits only the first copy
/// in dictionary order; every copy of a surface up to two characters
/// long is credited separately by the n-gram fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryTerm {
    pub term: String,
    pub weight: f64,
    pub layer: LayerId,
    /// Inherently negative term: always contributes `-weight`.
    #[serde(default)]
    pub is_negation_term: bool,
}

impl DictionaryTerm {
    pub fn new(term: impl Into<String>, weight: f64, layer: impl Into<LayerId>) -> Self {
        Self {
            term: term.into(),
            weight,
            layer: layer.into(),
            is_negation_term: false,
        }
    }

    pub fn negation(term: impl Into<String>, weight: f64, layer: impl Into<LayerId>) -> Self {
        Self {
            is_negation_term: true,
            ..Self::new(term, weight, layer)
        }
    }
}

/// Declared layer. `index` defines the canonical ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDef {
    pub slug: LayerId,
    pub index: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Conditional, prioritized projection from one layer onto another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    #[serde(default)]
    pub id: String,
    pub from_layer: LayerId,
    pub to_layer: LayerId,
    pub pattern: String,
    pub replacement: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub priority: i32,
}

/// Whether a rule's condition held, and a readable account of why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingOutcome {
    pub rule: MappingRule,
    pub applied: bool,
    pub reason: String,
}
