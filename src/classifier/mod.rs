//! Weighted logistic classifier
//!
//! The score is the weighted sum of every signal that has a weight
//! (booleans count as 1/0, labels are ignored). A logistic squash turns it
//! into the probability of AI authorship:
//!
//! ```text
//! p = 1 / (1 + e^(-score / temperature))
//! ```
//!
//! `p > ai_threshold` is AI-generated, `p < human_threshold` human-written,
//! anything in between uncertain.

pub mod weights;

pub use weights::WeightTable;

use crate::models::{Classification, Language, SignalVector, Verdict};
use serde::{Deserialize, Serialize};

/// Squashing and decision parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub temperature: f64,
    pub ai_threshold: f64,
    pub human_threshold: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            temperature: 10.0,
            ai_threshold: 0.7,
            human_threshold: 0.3,
        }
    }
}

/// Pure function of a signal vector; holds no per-request state
#[derive(Debug, Clone)]
pub struct Classifier {
    weights: WeightTable,
    settings: ClassifierSettings,
}

impl Classifier {
    pub fn new(weights: WeightTable) -> Self {
        Self::with_settings(weights, ClassifierSettings::default())
    }

    pub fn with_settings(weights: WeightTable, settings: ClassifierSettings) -> Self {
        Self { weights, settings }
    }

    /// Built-in weights and default settings
    pub fn for_language(language: Language) -> Self {
        Self::new(WeightTable::for_language(language))
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn settings(&self) -> ClassifierSettings {
        self.settings
    }

    /// Weighted sum over signals present in both the vector and the table
    pub fn score(&self, signals: &SignalVector) -> f64 {
        self.weights
            .iter()
            .filter_map(|(name, weight)| {
                signals
                    .get(name)
                    .and_then(|value| value.as_f64())
                    .map(|value| weight * value)
            })
            .sum()
    }

    pub fn probability(&self, score: f64) -> f64 {
        1.0 / (1.0 + (-score / self.settings.temperature).exp())
    }

    pub fn verdict(&self, probability: f64) -> Verdict {
        if probability > self.settings.ai_threshold {
            Verdict::AiGenerated
        } else if probability < self.settings.human_threshold {
            Verdict::HumanWritten
        } else {
            Verdict::Uncertain
        }
    }

    pub fn classify(&self, signals: &SignalVector) -> Classification {
        let probability = self.probability(self.score(signals));
        Classification {
            verdict: self.verdict(probability),
            probability,
        }
    }

    /// Classify, then record the probability as the `confidence` signal
    pub fn classify_into(&self, signals: &mut SignalVector) -> Classification {
        let classification = self.classify(signals);
        signals.insert("confidence", classification.probability);
        classification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SignalValue;

    fn vector(pairs: &[(&'static str, SignalValue)]) -> SignalVector {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_empty_vector_is_uncertain() {
        let classifier = Classifier::for_language(Language::Python);
        let result = classifier.classify(&SignalVector::new());
        assert_eq!(result.probability, 0.5);
        assert_eq!(result.verdict, Verdict::Uncertain);
    }

    #[test]
    fn test_score_uses_only_weighted_numeric_signals() {
        let classifier = Classifier::new(WeightTable::from_pairs([
            ("a", 2.0),
            ("b", -1.0),
            ("label", 100.0),
        ]));
        let signals = vector(&[
            ("a", SignalValue::Float(0.5)),
            ("b", SignalValue::Bool(true)),
            ("c", SignalValue::Int(50)),
            ("label", SignalValue::Label("es6")),
        ]);
        assert_eq!(classifier.score(&signals), 0.0);
    }

    #[test]
    fn test_thresholds() {
        let classifier = Classifier::new(WeightTable::from_pairs([("x", 1.0)]));
        let ai = classifier.classify(&vector(&[("x", SignalValue::Float(10.0))]));
        assert_eq!(ai.verdict, Verdict::AiGenerated);
        assert!((ai.probability - 0.7310585786).abs() < 1e-9);

        let human = classifier.classify(&vector(&[("x", SignalValue::Float(-10.0))]));
        assert_eq!(human.verdict, Verdict::HumanWritten);

        let mixed = classifier.classify(&vector(&[("x", SignalValue::Float(5.0))]));
        assert_eq!(mixed.verdict, Verdict::Uncertain);
    }

    #[test]
    fn test_probability_is_monotonic_in_positive_weights() {
        let classifier = Classifier::for_language(Language::JavaScript);
        let mut previous = 0.0;
        for step in 0..=10 {
            let value = step as f64 / 10.0;
            let signals = vector(&[
                ("generic_example_score", SignalValue::Float(value)),
                ("has_console_log", SignalValue::Bool(true)),
            ]);
            let p = classifier.classify(&signals).probability;
            assert!(p >= previous);
            previous = p;
        }
    }

    #[test]
    fn test_classify_into_records_confidence() {
        let classifier = Classifier::for_language(Language::Python);
        let mut signals = vector(&[("has_todo_comments", SignalValue::Bool(true))]);
        let result = classifier.classify_into(&mut signals);
        assert_eq!(signals.number("confidence"), Some(result.probability));
        assert!(result.probability < 0.5);
    }

    #[test]
    fn test_custom_settings() {
        let settings = ClassifierSettings {
            temperature: 1.0,
            ai_threshold: 0.9,
            human_threshold: 0.1,
        };
        let classifier =
            Classifier::with_settings(WeightTable::from_pairs([("x", 1.0)]), settings);
        let result = classifier.classify(&vector(&[("x", SignalValue::Float(1.0))]));
        assert_eq!(result.verdict, Verdict::Uncertain);
    }
}
