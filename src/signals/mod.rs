//! Signal extraction
//!
//! An [`Extractor`] turns one sample (text, tokens and the optional AST) into
//! a partial [`SignalVector`]. A [`Pipeline`] runs the fixed extractor set of
//! one language and assembles the complete vector:
//!
//! - AST-dependent extractors report their defaults when parsing failed
//! - text-pattern extractors never look at the AST
//! - a panicking extractor is replaced by its defaults
//! - any key an extractor forgot is back-filled from its defaults
//!
//! so the key set of the returned vector depends on the language only.

pub mod common;
pub mod javascript;
pub mod python;

use crate::lexer::Token;
use crate::models::{Language, SignalVector};
use crate::parsers::Ast;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error};

/// Raw text of one sample, split into lines once
#[derive(Debug, Clone)]
pub struct SourceSample<'a> {
    pub text: &'a str,
    pub lines: Vec<&'a str>,
}

impl<'a> SourceSample<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            lines: text.lines().collect(),
        }
    }
}

/// Everything an extractor may look at
#[derive(Debug, Clone, Copy)]
pub struct ExtractionInput<'a> {
    pub language: Language,
    pub sample: &'a SourceSample<'a>,
    /// Empty when tokenization failed
    pub tokens: &'a [Token],
    /// `None` when parsing failed
    pub ast: Option<&'a Ast>,
}

impl<'a> ExtractionInput<'a> {
    pub fn text(&self) -> &'a str {
        self.sample.text
    }

    pub fn lines(&self) -> &'a [&'a str] {
        &self.sample.lines
    }
}

/// One category of signals
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Every key this extractor produces, at its zero/false/"none" value
    fn defaults(&self) -> SignalVector;

    fn extract(&self, input: &ExtractionInput<'_>) -> SignalVector;
}

/// The fixed extractor set of one language
pub struct Pipeline {
    language: Language,
    extractors: Vec<Box<dyn Extractor>>,
}

impl Pipeline {
    pub fn new(language: Language, extractors: Vec<Box<dyn Extractor>>) -> Self {
        Self {
            language,
            extractors,
        }
    }

    /// Canonical pipeline of a language
    pub fn for_language(language: Language) -> Self {
        let extractors = match language {
            Language::Python => python::default_extractors(),
            Language::JavaScript => javascript::default_extractors(),
        };
        Self::new(language, extractors)
    }

    /// Union of every extractor's defaults
    pub fn defaults(&self) -> SignalVector {
        let mut signals = SignalVector::new();
        for extractor in &self.extractors {
            signals.merge(extractor.defaults());
        }
        signals
    }

    pub fn run(&self, input: &ExtractionInput<'_>) -> SignalVector {
        let mut signals = SignalVector::new();
        for extractor in &self.extractors {
            signals.merge(run_extractor(extractor.as_ref(), input));
        }
        debug!(
            "{} pipeline: {} extractors, {} signals",
            self.language,
            self.extractors.len(),
            signals.len()
        );
        signals
    }
}

fn run_extractor(extractor: &dyn Extractor, input: &ExtractionInput<'_>) -> SignalVector {
    let defaults = extractor.defaults();
    let mut signals = match catch_unwind(AssertUnwindSafe(|| extractor.extract(input))) {
        Ok(signals) => signals,
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            error!("Extractor {} panicked: {}", extractor.name(), panic_msg);
            return defaults;
        }
    };

    for (key, value) in defaults.iter() {
        if !signals.contains(key) {
            debug!("Extractor {} did not report {}", extractor.name(), key);
            signals.insert_default(key, *value);
        }
    }
    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SignalValue;

    struct Fixed;

    impl Extractor for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn defaults(&self) -> SignalVector {
            [("alpha", SignalValue::Float(0.0)), ("beta", SignalValue::Bool(false))]
                .into_iter()
                .collect()
        }

        fn extract(&self, _input: &ExtractionInput<'_>) -> SignalVector {
            // Forgets `beta`
            [("alpha", SignalValue::Float(0.5))].into_iter().collect()
        }
    }

    struct Panicking;

    impl Extractor for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn defaults(&self) -> SignalVector {
            [("gamma", SignalValue::Int(0))].into_iter().collect()
        }

        fn extract(&self, _input: &ExtractionInput<'_>) -> SignalVector {
            panic!("boom")
        }
    }

    fn run(pipeline: &Pipeline, text: &str) -> SignalVector {
        let sample = SourceSample::new(text);
        let input = ExtractionInput {
            language: Language::Python,
            sample: &sample,
            tokens: &[],
            ast: None,
        };
        pipeline.run(&input)
    }

    #[test]
    fn test_missing_keys_are_backfilled() {
        let pipeline = Pipeline::new(Language::Python, vec![Box::new(Fixed)]);
        let signals = run(&pipeline, "x = 1");
        assert_eq!(signals.number("alpha"), Some(0.5));
        assert_eq!(signals.flag("beta"), Some(false));
    }

    #[test]
    fn test_panicking_extractor_yields_defaults() {
        let pipeline = Pipeline::new(
            Language::Python,
            vec![Box::new(Fixed), Box::new(Panicking)],
        );
        let signals = run(&pipeline, "x = 1");
        assert_eq!(signals.len(), 3);
        assert_eq!(signals.number("gamma"), Some(0.0));
        assert_eq!(signals.number("alpha"), Some(0.5));
    }

    #[test]
    fn test_key_set_matches_defaults_for_any_input() {
        for language in Language::all() {
            let pipeline = Pipeline::for_language(language);
            let expected: Vec<&str> = pipeline.defaults().keys().collect();
            for text in ["", "???", "x = 1\n", "const y = 2;"] {
                let sample = SourceSample::new(text);
                let input = ExtractionInput {
                    language,
                    sample: &sample,
                    tokens: &[],
                    ast: None,
                };
                let keys: Vec<&str> = pipeline.run(&input).keys().collect();
                assert_eq!(keys, expected, "{language} / {text:?}");
            }
        }
    }

    #[test]
    fn test_sample_lines() {
        let sample = SourceSample::new("a\r\nb\n\nc");
        assert_eq!(sample.lines, vec!["a", "b", "", "c"]);
        assert!(SourceSample::new("").lines.is_empty());
    }
}
