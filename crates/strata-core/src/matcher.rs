// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Dictionary Matcher
// ─────────────────────────────────────────────────────────────────────
//! Longest-match-first literal scan with a bigram/unigram fallback.
//!
//! At each position the longest dictionary term that is a literal prefix
//! wins and the scan jumps past it. When nothing matches, every bigram
//! and unigram inside the lookahead window is compared against the
//! dictionary; each exact hit contributes at the n-gram penalty and the
//! scan advances by a single character. A position can therefore feed
//! several partial-credit hits (one per n-gram anchored in its window),
//! and the same surface can be credited from several preceding windows
//! before its own literal match.
//!
//! Contributions are never clamped here; negative totals survive until
//! aggregation.

use strata_types::{DictionaryTerm, EngineConfig, LayerId, NegationRange};

use crate::dictionary::{Dictionary, MAX_NGRAM};
use crate::negation::in_negation;

/// One contribution to a layer's raw score.
#[derive(Debug, Clone, PartialEq)]
pub struct TermHit {
    pub term: String,
    pub layer: LayerId,
    /// Character offsets into the normalized text.
    pub start: usize,
    pub end: usize,
    /// Signed contribution actually accumulated.
    pub weight: f64,
    pub in_negation: bool,
    pub via_ngram: bool,
}

/// Running total for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerAccumulator {
    pub layer: LayerId,
    pub raw_score: f64,
    pub matched_terms: Vec<String>,
}

/// Everything one scan produced. Accumulators are in first-hit order.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub accumulators: Vec<LayerAccumulator>,
    pub hits: Vec<TermHit>,
}

impl ScanOutcome {
    pub fn raw_score(&self, layer: &str) -> Option<f64> {
        self.accumulators
            .iter()
            .find(|a| a.layer.as_str() == layer)
            .map(|a| a.raw_score)
    }

    fn record(&mut self, term: &DictionaryTerm, hit: TermHit) {
        let idx = match self.accumulators.iter().position(|a| a.layer == term.layer) {
            Some(i) => i,
            None => {
                self.accumulators.push(LayerAccumulator {
                    layer: term.layer.clone(),
                    raw_score: 0.0,
                    matched_terms: Vec::new(),
                });
                self.accumulators.len() - 1
            }
        };
        let acc = &mut self.accumulators[idx];
        acc.raw_score += hit.weight;
        if !acc.matched_terms.contains(&term.term) {
            acc.matched_terms.push(term.term.clone());
        }
        self.hits.push(hit);
    }
}

/// Signed weight of a term at a position.
///
/// Inherent negation terms are always `-weight`; ordinary terms inside a
/// negation window are scaled by `polarity` (default -0.5).
#[inline]
pub fn effective_weight(term: &DictionaryTerm, in_negation: bool, polarity: f64) -> f64 {
    if term.is_negation_term {
        -term.weight
    } else if in_negation {
        term.weight * polarity
    } else {
        term.weight
    }
}

/// Scan normalized text (as chars) against a compiled dictionary.
pub fn scan(
    text: &[char],
    dictionary: &Dictionary,
    negations: &[NegationRange],
    config: &EngineConfig,
) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    if dictionary.is_empty() {
        return outcome;
    }

    let mut surface = String::with_capacity(MAX_NGRAM * 4);
    let mut pos = 0;
    while pos < text.len() {
        if let Some(ct) = dictionary.longest_prefix_at(text, pos) {
            let neg = in_negation(pos, negations);
            let weight = effective_weight(&ct.term, neg, config.negation_polarity);
            outcome.record(
                &ct.term,
                TermHit {
                    term: ct.term.term.clone(),
                    layer: ct.term.layer.clone(),
                    start: pos,
                    end: pos + ct.len(),
                    weight,
                    in_negation: neg,
                    via_ngram: false,
                },
            );
            pos += ct.len();
            continue;
        }

        let window_end = (pos + config.ngram_window).min(text.len());
        let window = &text[pos..window_end];
        // Bigrams first, then unigrams.
        for n in (1..=MAX_NGRAM).rev() {
            if window.len() < n {
                continue;
            }
            for offset in 0..=window.len() - n {
                surface.clear();
                surface.extend(&window[offset..offset + n]);
                let at = pos + offset;
                for ct in dictionary.exact(&surface) {
                    let neg = in_negation(at, negations);
                    let weight = effective_weight(&ct.term, neg, config.negation_polarity)
                        * config.ngram_penalty;
                    outcome.record(
                        &ct.term,
                        TermHit {
                            term: ct.term.term.clone(),
                            layer: ct.term.layer.clone(),
                            start: at,
                            end: at + n,
                            weight,
                            in_negation: neg,
                            via_ngram: true,
                        },
                    );
                }
            }
        }
        pos += 1;
    }

    log::debug!(
        "scan: {} chars, {} hits across {} layers",
        text.len(),
        outcome.hits.len(),
        outcome.accumulators.len()
    );
    outcome
}
