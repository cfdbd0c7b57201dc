// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Versioned Dictionary Snapshots
// ─────────────────────────────────────────────────────────────────────
//! Loading, validation, fingerprinting, and hot swap of the
//! dictionary/rule snapshot supplied by the external store.
//!
//! A published snapshot is immutable. Readers take an `Arc` once per
//! analysis, so a concurrent `publish` never changes the dictionary under
//! a running scan.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use strata_types::{DictionaryTerm, LayerDef, LayerId, MappingRule, StrataError, StrataResult};

use crate::dictionary::Dictionary;
use crate::mapping::Condition;

/// Serialized form handed over by the dictionary/rule store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionarySnapshot {
    pub version: String,
    #[serde(default)]
    pub layers: Vec<LayerDef>,
    pub terms: Vec<DictionaryTerm>,
    #[serde(default)]
    pub rules: Vec<MappingRule>,
}

impl DictionarySnapshot {
    pub fn new(version: impl Into<String>, terms: Vec<DictionaryTerm>) -> Self {
        Self {
            version: version.into(),
            layers: Vec::new(),
            terms,
            rules: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> StrataResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| StrataError::Snapshot(format!("JSON parse error: {e}")))
    }

    /// Check the snapshot against the engine's input contract.
    pub fn validate(&self) -> StrataResult<()> {
        if self.version.trim().is_empty() {
            return Err(StrataError::Snapshot("version must not be blank".to_string()));
        }
        if self.terms.is_empty() {
            return Err(StrataError::Snapshot(format!(
                "snapshot {} has no dictionary terms",
                self.version
            )));
        }

        let mut slugs: HashSet<&LayerId> = HashSet::new();
        let mut indices: HashSet<u32> = HashSet::new();
        for def in &self.layers {
            if def.slug.as_str().is_empty() {
                return Err(StrataError::Snapshot("layer slug must not be empty".to_string()));
            }
            if !slugs.insert(&def.slug) {
                return Err(StrataError::Snapshot(format!(
                    "duplicate layer slug {}",
                    def.slug
                )));
            }
            if !indices.insert(def.index) {
                return Err(StrataError::Snapshot(format!(
                    "duplicate layer index {}",
                    def.index
                )));
            }
        }
        let declared = |layer: &LayerId| self.layers.is_empty() || slugs.contains(layer);

        for (i, term) in self.terms.iter().enumerate() {
            if term.term.is_empty() {
                return Err(StrataError::Snapshot(format!("terms[{i}] has an empty surface")));
            }
            if !term.weight.is_finite() || term.weight <= 0.0 {
                return Err(StrataError::Snapshot(format!(
                    "terms[{i}] ({}) weight must be finite and > 0, got {}",
                    term.term, term.weight
                )));
            }
            if !declared(&term.layer) {
                return Err(StrataError::Snapshot(format!(
                    "terms[{i}] ({}) references undeclared layer {}",
                    term.term, term.layer
                )));
            }
        }

        for (i, rule) in self.rules.iter().enumerate() {
            for layer in [&rule.from_layer, &rule.to_layer] {
                if !declared(layer) {
                    return Err(StrataError::Snapshot(format!(
                        "rules[{i}] references undeclared layer {layer}"
                    )));
                }
            }
            if let Some(cond) = &rule.condition {
                if cond.parse::<Condition>().is_err() {
                    log::warn!("rules[{i}] condition {cond:?} is outside the condition grammar");
                }
            }
        }
        Ok(())
    }

    /// SHA-256 (hex) over the canonical JSON encoding.
    pub fn fingerprint(&self) -> StrataResult<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|e| StrataError::Snapshot(format!("fingerprint encoding failed: {e}")))?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// Memoization key for a text under a given snapshot fingerprint.
pub fn cache_key(text: &str, fingerprint: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fingerprint.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validated, compiled snapshot ready for scoring.
#[derive(Debug)]
pub struct Snapshot {
    source: DictionarySnapshot,
    dictionary: Dictionary,
    fingerprint: String,
}

impl Snapshot {
    pub fn compile(source: DictionarySnapshot) -> StrataResult<Self> {
        source.validate()?;
        let fingerprint = source.fingerprint()?;
        let dictionary = Dictionary::compile(&source.terms, &source.layers);
        Ok(Self {
            source,
            dictionary,
            fingerprint,
        })
    }

    pub fn version(&self) -> &str {
        &self.source.version
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.source.rules
    }

    pub fn layers(&self) -> &[LayerDef] {
        &self.source.layers
    }

    pub fn source(&self) -> &DictionarySnapshot {
        &self.source
    }
}

/// Holder of the current snapshot; swaps are atomic for readers.
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new(source: DictionarySnapshot) -> StrataResult<Self> {
        let snapshot = Snapshot::compile(source)?;
        log::info!(
            "snapshot {} loaded ({} terms, {} layers)",
            snapshot.version(),
            snapshot.dictionary().len(),
            snapshot.dictionary().layers().len()
        );
        Ok(Self {
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// The snapshot every new analysis will use.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    /// Validate and swap in a new snapshot. On error the old one stays.
    pub fn publish(&self, source: DictionarySnapshot) -> StrataResult<Arc<Snapshot>> {
        let next = Arc::new(Snapshot::compile(source)?);
        let previous = {
            let mut guard = self.current.write();
            std::mem::replace(&mut *guard, next.clone())
        };
        log::info!(
            "snapshot {} published (replacing {})",
            next.version(),
            previous.version()
        );
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(slug: &str, index: u32) -> LayerDef {
        LayerDef {
            slug: slug.into(),
            index,
            name: String::new(),
            description: String::new(),
        }
    }

    fn basic() -> DictionarySnapshot {
        DictionarySnapshot {
            version: "v1".into(),
            layers: vec![layer("l3", 3), layer("l4", 4)],
            terms: vec![
                DictionaryTerm::new("責任", 1.5, "l3"),
                DictionaryTerm::new("批判", 1.3, "l4"),
            ],
            rules: vec![],
        }
    }

    #[test]
    fn test_valid_snapshot() {
        assert!(basic().validate().is_ok());
    }

    #[test]
    fn test_rejects_nonpositive_weight() {
        let mut s = basic();
        s.terms[1].weight = 0.0;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("terms[1]"));

        s.terms[1].weight = f64::NAN;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_rejects_undeclared_layer() {
        let mut s = basic();
        s.terms.push(DictionaryTerm::new("制度", 1.0, "l5"));
        assert!(matches!(s.validate(), Err(StrataError::Snapshot(_))));
    }

    #[test]
    fn test_undeclared_layers_allowed_without_declarations() {
        let s = DictionarySnapshot::new("v1", vec![DictionaryTerm::new("x", 1.0, "anything")]);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_rejects_duplicate_layer_index() {
        let mut s = basic();
        s.layers.push(layer("l5", 4));
        assert!(s.validate().unwrap_err().to_string().contains("index 4"));
    }

    #[test]
    fn test_rejects_rule_to_unknown_layer() {
        let mut s = basic();
        s.rules.push(MappingRule {
            id: "r".into(),
            from_layer: "l3".into(),
            to_layer: "l9".into(),
            pattern: "p".into(),
            replacement: "q".into(),
            condition: None,
            priority: 0,
        });
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_terms_and_blank_version() {
        assert!(DictionarySnapshot::new("v1", vec![]).validate().is_err());
        let mut s = basic();
        s.version = "  ".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_fingerprint_stable_and_sensitive() {
        let a = basic().fingerprint().unwrap();
        assert_eq!(a, basic().fingerprint().unwrap());
        assert_eq!(a.len(), 64);
        let mut changed = basic();
        changed.terms[0].weight = 1.6;
        assert_ne!(a, changed.fingerprint().unwrap());
    }

    #[test]
    fn test_cache_key_depends_on_both() {
        let k1 = cache_key("text", "fp1");
        assert_eq!(k1, cache_key("text", "fp1"));
        assert_ne!(k1, cache_key("text", "fp2"));
        assert_ne!(k1, cache_key("text2", "fp1"));
    }

    #[test]
    fn test_store_publish_swaps_and_keeps_old_arc() {
        let store = SnapshotStore::new(basic()).unwrap();
        let before = store.current();
        let mut next = basic();
        next.version = "v2".into();
        store.publish(next).unwrap();
        assert_eq!(before.version(), "v1");
        assert_eq!(store.current().version(), "v2");
    }

    #[test]
    fn test_store_rejected_publish_keeps_current() {
        let store = SnapshotStore::new(basic()).unwrap();
        let bad = DictionarySnapshot::new("v2", vec![]);
        assert!(store.publish(bad).is_err());
        assert_eq!(store.current().version(), "v1");
    }

    #[test]
    fn test_from_json() {
        let s = DictionarySnapshot::from_json(
            r#"{"version":"v1","terms":[{"term":"責任","weight":1.5,"layer":"l3"}]}"#,
        )
        .unwrap();
        assert_eq!(s.terms.len(), 1);
        assert!(s.rules.is_empty());
        assert!(DictionarySnapshot::from_json("[]").is_err());
    }
}
