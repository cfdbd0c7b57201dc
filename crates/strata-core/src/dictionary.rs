// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Compiled Dictionary
// ─────────────────────────────────────────────────────────────────────
//! Match-ready form of a term list.
//!
//! Terms are stably sorted by descending length (in characters) so the
//! literal scan is longest-match-first; equal lengths keep their input
//! order. Two indexes narrow the scan without changing its outcome:
//! a first-character bucket for literal prefix matching and an
//! exact-surface table for the short n-gram fallback.

use std::collections::HashMap;

use strata_types::{DictionaryTerm, LayerDef, LayerId};

/// Longest n-gram the fallback scan generates.
pub const MAX_NGRAM: usize = 2;

/// A term with its surface pre-split into characters.
#[derive(Debug, Clone)]
pub struct CompiledTerm {
    pub term: DictionaryTerm,
    pub chars: Vec<char>,
}

impl CompiledTerm {
    #[inline]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// Length-sorted, indexed dictionary plus its layer universe.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    terms: Vec<CompiledTerm>,
    by_first_char: HashMap<char, Vec<usize>>,
    short_surfaces: HashMap<String, Vec<usize>>,
    layers: Vec<LayerId>,
}

impl Dictionary {
    /// Compile terms with no declared layers: the universe is every
    /// referenced layer in first-appearance order.
    pub fn from_terms(terms: &[DictionaryTerm]) -> Self {
        Self::compile(terms, &[])
    }

    /// Compile terms against declared layers. Declared layers come first
    /// (by `index`), then any layer only a term references.
    ///
    /// Empty surfaces are dropped: they would match everywhere without
    /// advancing the scan.
    pub fn compile(terms: &[DictionaryTerm], declared: &[LayerDef]) -> Self {
        let mut declared: Vec<&LayerDef> = declared.iter().collect();
        declared.sort_by_key(|d| d.index);

        let mut layers: Vec<LayerId> = Vec::new();
        for def in declared {
            if !layers.contains(&def.slug) {
                layers.push(def.slug.clone());
            }
        }
        for term in terms {
            if !layers.contains(&term.layer) {
                layers.push(term.layer.clone());
            }
        }

        let mut compiled: Vec<CompiledTerm> = terms
            .iter()
            .filter(|t| !t.term.is_empty())
            .map(|t| CompiledTerm {
                chars: t.term.chars().collect(),
                term: t.clone(),
            })
            .collect();
        // Stable: equal lengths keep dictionary order.
        compiled.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut by_first_char: HashMap<char, Vec<usize>> = HashMap::new();
        let mut short_surfaces: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, ct) in compiled.iter().enumerate() {
            by_first_char.entry(ct.chars[0]).or_default().push(i);
            if ct.len() <= MAX_NGRAM {
                short_surfaces.entry(ct.term.term.clone()).or_default().push(i);
            }
        }

        Self {
            terms: compiled,
            by_first_char,
            short_surfaces,
            layers,
        }
    }

    /// Terms in scan order (longest first).
    pub fn terms(&self) -> &[CompiledTerm] {
        &self.terms
    }

    /// Every known layer, in canonical order.
    pub fn layers(&self) -> &[LayerId] {
        &self.layers
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Canonical position of a layer, used as the score tie-break.
    pub fn layer_rank(&self, layer: &LayerId) -> usize {
        self.layers
            .iter()
            .position(|l| l == layer)
            .unwrap_or(self.layers.len())
    }

    /// Longest term that is a literal prefix of `text[pos..]`.
    pub fn longest_prefix_at(&self, text: &[char], pos: usize) -> Option<&CompiledTerm> {
        let first = text.get(pos)?;
        let bucket = self.by_first_char.get(first)?;
        let rest = &text[pos..];
        bucket
            .iter()
            .map(|&i| &self.terms[i])
            .find(|ct| rest.starts_with(&ct.chars))
    }

    /// All terms whose surface equals `surface` exactly, in scan order.
    /// Only surfaces up to `MAX_NGRAM` characters are indexed.
    pub fn exact(&self, surface: &str) -> impl Iterator<Item = &CompiledTerm> {
        self.short_surfaces
            .get(surface)
            .into_iter()
            .flatten()
            .map(move |&i| &self.terms[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_sorted_longest_first_stable() {
        let dict = Dictionary::from_terms(&[
            DictionaryTerm::new("愛", 1.0, "a"),
            DictionaryTerm::new("愛情", 1.0, "b"),
            DictionaryTerm::new("恋", 1.0, "c"),
        ]);
        let order: Vec<&str> = dict.terms().iter().map(|t| t.term.term.as_str()).collect();
        assert_eq!(order, vec!["愛情", "愛", "恋"]);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let dict = Dictionary::from_terms(&[
            DictionaryTerm::new("愛", 1.0, "a"),
            DictionaryTerm::new("愛情", 1.0, "b"),
        ]);
        let text = chars("愛情深い");
        let hit = dict.longest_prefix_at(&text, 0).unwrap();
        assert_eq!(hit.term.layer.as_str(), "b");
        assert!(dict.longest_prefix_at(&text, 2).is_none());
        assert!(dict.longest_prefix_at(&text, 99).is_none());
    }

    #[test]
    fn test_universe_declared_then_referenced() {
        let declared = vec![
            LayerDef {
                slug: "l1".into(),
                index: 1,
                name: String::new(),
                description: String::new(),
            },
            LayerDef {
                slug: "l0".into(),
                index: 0,
                name: String::new(),
                description: String::new(),
            },
        ];
        let dict = Dictionary::compile(&[DictionaryTerm::new("x", 1.0, "l9")], &declared);
        let layers: Vec<&str> = dict.layers().iter().map(|l| l.as_str()).collect();
        assert_eq!(layers, vec!["l0", "l1", "l9"]);
        assert_eq!(dict.layer_rank(&"l9".into()), 2);
        assert_eq!(dict.layer_rank(&"zz".into()), 3);
    }

    #[test]
    fn test_empty_term_dropped_but_layer_known() {
        let dict = Dictionary::from_terms(&[DictionaryTerm::new("", 1.0, "l2")]);
        assert!(dict.is_empty());
        assert_eq!(dict.layers().len(), 1);
    }

    #[test]
    fn test_exact_keeps_duplicates() {
        let dict = Dictionary::from_terms(&[
            DictionaryTerm::new("批判", 1.0, "l4"),
            DictionaryTerm::new("批判", 0.5, "l4"),
            DictionaryTerm::new("批判的", 0.5, "l4"),
        ]);
        assert_eq!(dict.exact("批判").count(), 2);
        // Longer than MAX_NGRAM: never an n-gram candidate.
        assert_eq!(dict.exact("批判的").count(), 0);
    }
}
