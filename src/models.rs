//! Core data models for codect
//!
//! These models are shared by the lexers, parsers, signal extractors and the
//! classifier: the analyzed language, the tagged signal values, the ordered
//! signal vector and the final classification.

use crate::error::AnalysisError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Languages the engine can analyze
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
}

impl Language {
    /// Canonical lowercase name, as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
        }
    }

    /// Infer the language from a file extension (without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" | "pyi" => Some(Language::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            _ => None,
        }
    }

    pub fn all() -> [Language; 2] {
        [Language::Python, Language::JavaScript]
    }
}

impl FromStr for Language {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::JavaScript),
            other => Err(AnalysisError::UnsupportedLanguage(other.to_string())),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single signal value.
///
/// Closed set of variants: the classifier only weights `Bool`, `Int` and
/// `Float`; `Label` values are carried for display only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Label(&'static str),
}

impl SignalValue {
    /// Numeric view used for scoring. `None` for labels.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            SignalValue::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            SignalValue::Int(i) => Some(i as f64),
            SignalValue::Float(x) => Some(x),
            SignalValue::Label(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            SignalValue::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl From<bool> for SignalValue {
    fn from(b: bool) -> Self {
        SignalValue::Bool(b)
    }
}

impl From<i64> for SignalValue {
    fn from(i: i64) -> Self {
        SignalValue::Int(i)
    }
}

impl From<usize> for SignalValue {
    fn from(n: usize) -> Self {
        SignalValue::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<f64> for SignalValue {
    fn from(x: f64) -> Self {
        SignalValue::Float(x)
    }
}

impl From<&'static str> for SignalValue {
    fn from(s: &'static str) -> Self {
        SignalValue::Label(s)
    }
}

impl Serialize for SignalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            SignalValue::Bool(b) => serializer.serialize_bool(b),
            SignalValue::Int(i) => serializer.serialize_i64(i),
            SignalValue::Float(x) => serializer.serialize_f64(x),
            SignalValue::Label(s) => serializer.serialize_str(s),
        }
    }
}

/// Mapping from signal name to value, ordered by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalVector {
    values: BTreeMap<&'static str, SignalValue>,
}

impl SignalVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: impl Into<SignalValue>) {
        self.values.insert(name, value.into());
    }

    /// Insert only if the key is absent
    pub fn insert_default(&mut self, name: &'static str, value: SignalValue) {
        self.values.entry(name).or_insert(value);
    }

    pub fn get(&self, name: &str) -> Option<&SignalValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Numeric value of a signal (booleans as 0/1)
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(SignalValue::as_f64)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(SignalValue::as_bool)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &SignalValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge another vector into this one (other wins on conflicts)
    pub fn merge(&mut self, other: SignalVector) {
        self.values.extend(other.values);
    }

    /// Copy of the vector restricted to the given keys
    pub fn subset(&self, keys: &[&str]) -> SignalVector {
        let values = self
            .values
            .iter()
            .filter(|(k, _)| keys.contains(*k))
            .map(|(k, v)| (*k, *v))
            .collect();
        SignalVector { values }
    }
}

impl Serialize for SignalVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in &self.values {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl FromIterator<(&'static str, SignalValue)> for SignalVector {
    fn from_iter<I: IntoIterator<Item = (&'static str, SignalValue)>>(iter: I) -> Self {
        SignalVector {
            values: iter.into_iter().collect(),
        }
    }
}

/// Three-way verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    AiGenerated,
    HumanWritten,
    Uncertain,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::AiGenerated => "AI-Generated Code",
            Verdict::HumanWritten => "Human-Written Code",
            Verdict::Uncertain => "Uncertain (Mixed Signals)",
        }
    }

    /// Binary result used by the basic response shape: 1 = AI, 0 = otherwise
    pub fn as_result(&self) -> u8 {
        match self {
            Verdict::AiGenerated => 1,
            _ => 0,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Probability plus verdict for one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub verdict: Verdict,
    /// Probability of AI authorship, in [0, 1]
    pub probability: f64,
}

/// Complete result of analyzing one snippet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub language: Language,
    pub classification: Classification,
    pub signals: SignalVector,
}

impl Analysis {
    pub fn verdict(&self) -> Verdict {
        self.classification.verdict
    }

    pub fn probability(&self) -> f64 {
        self.classification.probability
    }
}
