// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Mapping Rule Engine
// ─────────────────────────────────────────────────────────────────────
//! Evaluates prioritized layer-to-layer mapping rules against scores.
//!
//! Mapping is explanatory: outcomes report which rules' conditions held,
//! scores are never rewritten. Conditions follow the grammar
//! `score_<slug> <op> <number>` with `<op>` one of `> < >= <= ==`.
//!
//! A condition naming an unscored layer is false. A string outside the
//! grammar is true under [`ConditionPolicy::Lenient`] (the historical
//! behavior, pinned by tests) and false under [`ConditionPolicy::Strict`].

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use strata_types::{LayerId, LayerScore, MappingOutcome, MappingRule, StrataError};

static CONDITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^score_([A-Za-z0-9_]+)\s*(>=|<=|==|>|<)\s*([0-9.]+)$")
        .expect("condition grammar regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
}

impl CompareOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Gt => lhs > rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Eq => lhs == rhs,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
        })
    }
}

/// Parsed `score_<slug> <op> <number>` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub layer: LayerId,
    pub op: CompareOp,
    /// NaN when the numeric part has no valid prefix (e.g. `"."`);
    /// a NaN threshold never compares true.
    pub threshold: f64,
}

/// Longest valid decimal prefix of a digits-and-dots string.
fn leading_float(digits: &str) -> f64 {
    let cut = digits
        .char_indices()
        .filter(|&(_, c)| c == '.')
        .nth(1)
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    digits[..cut].parse::<f64>().unwrap_or(f64::NAN)
}

impl FromStr for Condition {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = CONDITION_RE
            .captures(s)
            .ok_or_else(|| StrataError::Condition(s.to_string()))?;
        let op = match &caps[2] {
            ">" => CompareOp::Gt,
            "<" => CompareOp::Lt,
            ">=" => CompareOp::Ge,
            "<=" => CompareOp::Le,
            "==" => CompareOp::Eq,
            _ => return Err(StrataError::Condition(s.to_string())),
        };
        Ok(Self {
            layer: LayerId::from(&caps[1]),
            op,
            threshold: leading_float(&caps[3]),
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "score_{} {} {}", self.layer, self.op, self.threshold)
    }
}

/// How malformed condition strings are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConditionPolicy {
    /// Malformed ⇒ applied.
    #[default]
    Lenient,
    /// Malformed ⇒ not applied.
    Strict,
}

impl ConditionPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            ConditionPolicy::Strict
        } else {
            ConditionPolicy::Lenient
        }
    }
}

/// Result of checking one rule's condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionCheck {
    Unconditional,
    Met { observed: f64 },
    NotMet { observed: f64 },
    UnknownLayer(LayerId),
    Malformed,
}

/// Check a raw condition string against scores.
pub fn check_condition(condition: Option<&str>, scores: &[LayerScore]) -> ConditionCheck {
    let Some(raw) = condition else {
        return ConditionCheck::Unconditional;
    };
    let cond = match raw.parse::<Condition>() {
        Ok(c) => c,
        Err(_) => return ConditionCheck::Malformed,
    };
    match scores.iter().find(|s| s.layer == cond.layer) {
        None => ConditionCheck::UnknownLayer(cond.layer),
        Some(s) if cond.op.apply(s.normalized_score, cond.threshold) => ConditionCheck::Met {
            observed: s.normalized_score,
        },
        Some(s) => ConditionCheck::NotMet {
            observed: s.normalized_score,
        },
    }
}

fn outcome_for(rule: &MappingRule, scores: &[LayerScore], policy: ConditionPolicy) -> MappingOutcome {
    let raw = rule.condition.as_deref();
    let cond = raw.unwrap_or_default();
    let (applied, reason) = match check_condition(raw, scores) {
        ConditionCheck::Unconditional => (true, "no condition; rule applies".to_string()),
        ConditionCheck::Met { observed } => (
            true,
            format!("condition met: {cond} (observed {observed:.4})"),
        ),
        ConditionCheck::NotMet { observed } => (
            false,
            format!("condition not met: {cond} (observed {observed:.4})"),
        ),
        ConditionCheck::UnknownLayer(layer) => (
            false,
            format!("condition not met: {cond} (layer {layer} is not scored)"),
        ),
        ConditionCheck::Malformed => match policy {
            ConditionPolicy::Lenient => {
                log::warn!(
                    "mapping rule {:?}: malformed condition {cond:?} passes by default",
                    rule.id
                );
                (true, format!("malformed condition passes by default: {cond:?}"))
            }
            ConditionPolicy::Strict => {
                (false, format!("malformed condition rejected: {cond:?}"))
            }
        },
    };
    MappingOutcome {
        rule: rule.clone(),
        applied,
        reason,
    }
}

/// Evaluate the rules for one `(from, to)` pair, highest priority first.
/// Rules for other pairs are ignored; equal priorities keep input order.
pub fn evaluate_rules(
    rules: &[MappingRule],
    scores: &[LayerScore],
    from: &LayerId,
    to: &LayerId,
    policy: ConditionPolicy,
) -> Vec<MappingOutcome> {
    let mut candidates: Vec<&MappingRule> = rules
        .iter()
        .filter(|r| &r.from_layer == from && &r.to_layer == to)
        .collect();
    candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
    candidates
        .into_iter()
        .map(|rule| outcome_for(rule, scores, policy))
        .collect()
}
