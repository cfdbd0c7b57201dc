// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied, PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the Strata scoring engine.
//!
//! Exposes `LayerEngine`, `EngineConfig`, and the result types to Python
//! via PyO3. Every Rust error surfaces as `ValueError`.
//!
//! Install: `pip install -e crates/strata-ffi` (requires maturin).
//!
//! Usage from Python:
//! ```python
//! from strata_engine import EngineConfig, LayerEngine
//!
//! engine = LayerEngine(open("seed_snapshot.json").read(), EngineConfig())
//! result = engine.score("責任を取らないことが批判された")
//! print(result.dominant_layer, result.to_dict())
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use strata_core::{Analysis, DictionarySnapshot, LayerEngine};
use strata_types::{
    AnalysisResult, EngineConfig, HighlightSpan, HintLocale, LayerId, LayerScore, MappingOutcome,
    MatchedTerm, StrataError,
};

fn to_py_err(e: StrataError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn parse_locale(locale: &str) -> PyResult<HintLocale> {
    match locale {
        "en" => Ok(HintLocale::En),
        "ja" => Ok(HintLocale::Ja),
        other => Err(PyValueError::new_err(format!(
            "hint_locale must be \"en\" or \"ja\", got {other:?}"
        ))),
    }
}

// ─── PyEngineConfig ─────────────────────────────────────────────────

/// Python-visible engine configuration.
#[pyclass(name = "EngineConfig")]
#[derive(Clone)]
struct PyEngineConfig {
    inner: EngineConfig,
}

#[pymethods]
impl PyEngineConfig {
    #[new]
    #[pyo3(signature = (
        negation_cues = None,
        negation_window = 5,
        negation_polarity = -0.5,
        ngram_window = 4,
        ngram_penalty = 0.5,
        activation_threshold = 0.15,
        composite_threshold = 0.5,
        dominance_threshold = 0.8,
        fallback_layer = "l0",
        max_input_chars = 5000,
        strict_conditions = false,
        hint_locale = "en",
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        negation_cues: Option<Vec<String>>,
        negation_window: usize,
        negation_polarity: f64,
        ngram_window: usize,
        ngram_penalty: f64,
        activation_threshold: f64,
        composite_threshold: f64,
        dominance_threshold: f64,
        fallback_layer: &str,
        max_input_chars: usize,
        strict_conditions: bool,
        hint_locale: &str,
    ) -> PyResult<Self> {
        let defaults = EngineConfig::default();
        let config = EngineConfig {
            negation_cues: negation_cues.unwrap_or(defaults.negation_cues),
            negation_window,
            negation_polarity,
            ngram_window,
            ngram_penalty,
            activation_threshold,
            composite_threshold,
            dominance_threshold,
            fallback_layer: fallback_layer.to_string(),
            max_input_chars,
            strict_conditions,
            hint_locale: parse_locale(hint_locale)?,
        };
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    /// Construct from JSON string.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config = EngineConfig::from_json(json).map_err(to_py_err)?;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    #[getter]
    fn negation_cues(&self) -> Vec<String> {
        self.inner.negation_cues.clone()
    }

    #[getter]
    fn negation_window(&self) -> usize {
        self.inner.negation_window
    }

    #[getter]
    fn ngram_window(&self) -> usize {
        self.inner.ngram_window
    }

    #[getter]
    fn max_input_chars(&self) -> usize {
        self.inner.max_input_chars
    }

    #[getter]
    fn strict_conditions(&self) -> bool {
        self.inner.strict_conditions
    }

    #[getter]
    fn hint_locale(&self) -> String {
        self.inner.hint_locale.to_string()
    }

    fn __repr__(&self) -> String {
        format!(
            "EngineConfig(negation_window={}, ngram_window={}, max_input_chars={}, hint_locale={})",
            self.inner.negation_window,
            self.inner.ngram_window,
            self.inner.max_input_chars,
            self.inner.hint_locale
        )
    }
}

// ─── Result types ───────────────────────────────────────────────────

fn layer_score_dict<'py>(py: Python<'py>, s: &LayerScore) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("layer", s.layer.as_str())?;
    dict.set_item("raw_score", s.raw_score)?;
    dict.set_item("normalized_score", s.normalized_score)?;
    dict.set_item("matched_terms", s.matched_terms.clone())?;
    Ok(dict)
}

/// Per-layer score.
#[pyclass(name = "LayerScore")]
#[derive(Clone)]
struct PyLayerScore {
    inner: LayerScore,
}

#[pymethods]
impl PyLayerScore {
    #[getter]
    fn layer(&self) -> &str {
        self.inner.layer.as_str()
    }

    #[getter]
    fn raw_score(&self) -> f64 {
        self.inner.raw_score
    }

    #[getter]
    fn normalized_score(&self) -> f64 {
        self.inner.normalized_score
    }

    #[getter]
    fn matched_terms(&self) -> Vec<String> {
        self.inner.matched_terms.clone()
    }

    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        layer_score_dict(py, &self.inner)
    }

    fn __repr__(&self) -> String {
        format!(
            "LayerScore(layer={}, raw={:.4}, normalized={:.4})",
            self.inner.layer, self.inner.raw_score, self.inner.normalized_score
        )
    }
}

fn analysis_result_dict<'py>(py: Python<'py>, r: &AnalysisResult) -> PyResult<Bound<'py, PyDict>> {
    let scores = PyList::empty(py);
    for s in &r.scores {
        scores.append(layer_score_dict(py, s)?)?;
    }
    let dict = PyDict::new(py);
    dict.set_item("scores", scores)?;
    dict.set_item("dominant_layer", r.dominant_layer.as_str())?;
    dict.set_item("crossover_degree", r.crossover_degree)?;
    dict.set_item("entropy", r.entropy)?;
    dict.set_item("decomposition_hints", r.decomposition_hints.clone())?;
    dict.set_item("normalized_text", r.normalized_text.as_str())?;
    Ok(dict)
}

/// Result of scoring one text.
#[pyclass(name = "AnalysisResult")]
#[derive(Clone)]
struct PyAnalysisResult {
    inner: AnalysisResult,
}

#[pymethods]
impl PyAnalysisResult {
    #[getter]
    fn scores(&self) -> Vec<PyLayerScore> {
        self.inner
            .scores
            .iter()
            .cloned()
            .map(|inner| PyLayerScore { inner })
            .collect()
    }

    #[getter]
    fn dominant_layer(&self) -> &str {
        self.inner.dominant_layer.as_str()
    }

    #[getter]
    fn crossover_degree(&self) -> f64 {
        self.inner.crossover_degree
    }

    #[getter]
    fn entropy(&self) -> f64 {
        self.inner.entropy
    }

    #[getter]
    fn decomposition_hints(&self) -> Vec<String> {
        self.inner.decomposition_hints.clone()
    }

    #[getter]
    fn normalized_text(&self) -> &str {
        &self.inner.normalized_text
    }

    /// `(term, layer)` pairs in score order, ready for `highlight`.
    fn matched_terms(&self) -> Vec<(String, String)> {
        self.inner
            .matched_terms()
            .into_iter()
            .map(|m| (m.term, m.layer.to_string()))
            .collect()
    }

    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        analysis_result_dict(py, &self.inner)
    }

    fn __repr__(&self) -> String {
        format!(
            "AnalysisResult(dominant={}, crossover={:.4}, entropy={:.4}, layers={})",
            self.inner.dominant_layer,
            self.inner.crossover_degree,
            self.inner.entropy,
            self.inner.scores.len()
        )
    }
}

fn span_dict<'py>(py: Python<'py>, s: &HighlightSpan) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("text", s.text.as_str())?;
    dict.set_item("layer", s.layer.as_ref().map(LayerId::as_str))?;
    dict.set_item("start", s.start)?;
    dict.set_item("end", s.end)?;
    Ok(dict)
}

/// Labeled or gap span; offsets are character indices.
#[pyclass(name = "HighlightSpan")]
#[derive(Clone)]
struct PyHighlightSpan {
    inner: HighlightSpan,
}

#[pymethods]
impl PyHighlightSpan {
    #[getter]
    fn text(&self) -> &str {
        &self.inner.text
    }

    #[getter]
    fn layer(&self) -> Option<&str> {
        self.inner.layer.as_ref().map(LayerId::as_str)
    }

    #[getter]
    fn start(&self) -> usize {
        self.inner.start
    }

    #[getter]
    fn end(&self) -> usize {
        self.inner.end
    }

    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        span_dict(py, &self.inner)
    }

    fn __repr__(&self) -> String {
        format!(
            "HighlightSpan({:?}, layer={}, {}..{})",
            self.inner.text,
            self.inner.layer.as_ref().map(LayerId::as_str).unwrap_or("-"),
            self.inner.start,
            self.inner.end
        )
    }
}

/// Evaluation of one mapping rule.
#[pyclass(name = "MappingOutcome")]
#[derive(Clone)]
struct PyMappingOutcome {
    inner: MappingOutcome,
}

#[pymethods]
impl PyMappingOutcome {
    #[getter]
    fn rule_id(&self) -> &str {
        &self.inner.rule.id
    }

    #[getter]
    fn pattern(&self) -> &str {
        &self.inner.rule.pattern
    }

    #[getter]
    fn replacement(&self) -> &str {
        &self.inner.rule.replacement
    }

    #[getter]
    fn priority(&self) -> i32 {
        self.inner.rule.priority
    }

    #[getter]
    fn applied(&self) -> bool {
        self.inner.applied
    }

    #[getter]
    fn reason(&self) -> &str {
        &self.inner.reason
    }

    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let rule = &self.inner.rule;
        let dict = PyDict::new(py);
        dict.set_item("rule_id", rule.id.as_str())?;
        dict.set_item("from_layer", rule.from_layer.as_str())?;
        dict.set_item("to_layer", rule.to_layer.as_str())?;
        dict.set_item("pattern", rule.pattern.as_str())?;
        dict.set_item("replacement", rule.replacement.as_str())?;
        dict.set_item("condition", rule.condition.as_deref())?;
        dict.set_item("priority", rule.priority)?;
        dict.set_item("applied", self.inner.applied)?;
        dict.set_item("reason", self.inner.reason.as_str())?;
        Ok(dict)
    }

    fn __repr__(&self) -> String {
        format!(
            "MappingOutcome(rule={}, applied={})",
            self.inner.rule.id, self.inner.applied
        )
    }
}

/// Scores, highlights, and cache key for one text.
#[pyclass(name = "Analysis")]
#[derive(Clone)]
struct PyAnalysis {
    inner: Analysis,
}

#[pymethods]
impl PyAnalysis {
    #[getter]
    fn result(&self) -> PyAnalysisResult {
        PyAnalysisResult {
            inner: self.inner.result.clone(),
        }
    }

    #[getter]
    fn highlights(&self) -> Vec<PyHighlightSpan> {
        self.inner
            .highlights
            .iter()
            .cloned()
            .map(|inner| PyHighlightSpan { inner })
            .collect()
    }

    #[getter]
    fn normalized_highlights(&self) -> Vec<PyHighlightSpan> {
        self.inner
            .normalized_highlights
            .iter()
            .cloned()
            .map(|inner| PyHighlightSpan { inner })
            .collect()
    }

    #[getter]
    fn snapshot_version(&self) -> &str {
        &self.inner.snapshot_version
    }

    #[getter]
    fn cache_key(&self) -> &str {
        &self.inner.cache_key
    }

    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let highlights = PyList::empty(py);
        for s in &self.inner.highlights {
            highlights.append(span_dict(py, s)?)?;
        }
        let normalized_highlights = PyList::empty(py);
        for s in &self.inner.normalized_highlights {
            normalized_highlights.append(span_dict(py, s)?)?;
        }
        let dict = PyDict::new(py);
        dict.set_item("result", analysis_result_dict(py, &self.inner.result)?)?;
        dict.set_item("highlights", highlights)?;
        dict.set_item("normalized_highlights", normalized_highlights)?;
        dict.set_item("snapshot_version", self.inner.snapshot_version.as_str())?;
        dict.set_item("cache_key", self.inner.cache_key.as_str())?;
        Ok(dict)
    }

    fn __repr__(&self) -> String {
        format!(
            "Analysis(dominant={}, spans={}, snapshot={})",
            self.inner.result.dominant_layer,
            self.inner.highlights.len(),
            self.inner.snapshot_version
        )
    }
}

// ─── LayerEngine ────────────────────────────────────────────────────

/// Layered concept scoring engine bound to a dictionary snapshot.
#[pyclass(name = "LayerEngine")]
struct PyLayerEngine {
    inner: LayerEngine,
}

#[pymethods]
impl PyLayerEngine {
    /// Args:
    ///     snapshot_json: Serialized dictionary snapshot (version, layers,
    ///         terms, rules).
    ///     config: Optional `EngineConfig`; defaults when omitted.
    #[new]
    #[pyo3(signature = (snapshot_json, config = None))]
    fn new(snapshot_json: &str, config: Option<PyEngineConfig>) -> PyResult<Self> {
        let snapshot = DictionarySnapshot::from_json(snapshot_json).map_err(to_py_err)?;
        let config = config.map(|c| c.inner).unwrap_or_default();
        let inner = LayerEngine::new(config, snapshot).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Score without input bounds. Never fails.
    fn score(&self, text: &str) -> PyAnalysisResult {
        PyAnalysisResult {
            inner: self.inner.score(text),
        }
    }

    /// Validate, score, and highlight one text.
    fn analyze(&self, text: &str) -> PyResult<PyAnalysis> {
        let inner = self.inner.analyze(text).map_err(to_py_err)?;
        Ok(PyAnalysis { inner })
    }

    /// Args:
    ///     text: Text to partition.
    ///     matched_terms: `(term, layer)` pairs, e.g. `result.matched_terms()`.
    fn highlight(&self, text: &str, matched_terms: Vec<(String, String)>) -> Vec<PyHighlightSpan> {
        let matched: Vec<MatchedTerm> = matched_terms
            .into_iter()
            .map(|(term, layer)| MatchedTerm::new(term, layer))
            .collect();
        self.inner
            .highlight(text, &matched)
            .into_iter()
            .map(|inner| PyHighlightSpan { inner })
            .collect()
    }

    /// Score `text` and evaluate the snapshot's `(from_layer, to_layer)` rules.
    fn map(&self, text: &str, from_layer: &str, to_layer: &str) -> PyResult<Vec<PyMappingOutcome>> {
        let outcomes = self
            .inner
            .map(text, &LayerId::from(from_layer), &LayerId::from(to_layer))
            .map_err(to_py_err)?;
        Ok(outcomes
            .into_iter()
            .map(|inner| PyMappingOutcome { inner })
            .collect())
    }

    /// Score 2 to 5 texts against the same snapshot.
    fn compare(&self, texts: Vec<String>) -> PyResult<Vec<PyAnalysisResult>> {
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let results = self.inner.compare(&refs).map_err(to_py_err)?;
        Ok(results
            .into_iter()
            .map(|inner| PyAnalysisResult { inner })
            .collect())
    }

    /// Validate and publish a new snapshot; the old one stays on error.
    fn reload(&self, snapshot_json: &str) -> PyResult<()> {
        let snapshot = DictionarySnapshot::from_json(snapshot_json).map_err(to_py_err)?;
        self.inner.reload(snapshot).map_err(to_py_err)
    }

    #[getter]
    fn snapshot_version(&self) -> String {
        self.inner.snapshot().version().to_string()
    }

    #[getter]
    fn fingerprint(&self) -> String {
        self.inner.snapshot().fingerprint().to_string()
    }

    #[getter]
    fn layers(&self) -> Vec<String> {
        self.inner
            .snapshot()
            .dictionary()
            .layers()
            .iter()
            .map(LayerId::to_string)
            .collect()
    }

    fn __repr__(&self) -> String {
        let snapshot = self.inner.snapshot();
        format!(
            "LayerEngine(snapshot={}, terms={}, rules={})",
            snapshot.version(),
            snapshot.dictionary().len(),
            snapshot.rules().len()
        )
    }
}

// ─── Module Registration ────────────────────────────────────────────

/// Strata: layered concept scoring over versioned Japanese dictionaries.
///
/// - `EngineConfig`: configuration
/// - `LayerEngine`: score, analyze, highlight, map, compare, reload
/// - `AnalysisResult`, `LayerScore`, `Analysis`: score results
/// - `HighlightSpan`, `MappingOutcome`: highlight and mapping results
#[pymodule]
fn strata_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyEngineConfig>()?;
    m.add_class::<PyLayerEngine>()?;
    m.add_class::<PyAnalysisResult>()?;
    m.add_class::<PyLayerScore>()?;
    m.add_class::<PyAnalysis>()?;
    m.add_class::<PyHighlightSpan>()?;
    m.add_class::<PyMappingOutcome>()?;
    Ok(())
}
