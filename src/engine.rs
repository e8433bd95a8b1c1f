//! Language dispatcher
//!
//! Holds one immutable pipeline and classifier per language. Lexer and
//! parser failures degrade to default signals; only an unsupported
//! language, invalid UTF-8 or an unexpected panic reach the caller.

use crate::classifier::Classifier;
use crate::config::EngineConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::lexer;
use crate::models::{Analysis, Language, SignalVector};
use crate::parsers;
use crate::signals::{ExtractionInput, Pipeline, SourceSample};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error, warn};

struct LanguageSupport {
    pipeline: Pipeline,
    classifier: Classifier,
}

impl LanguageSupport {
    fn new(language: Language, config: &EngineConfig) -> Self {
        Self {
            pipeline: Pipeline::for_language(language),
            classifier: config.classifier(language),
        }
    }
}

/// Shareable across threads; every call works on request-local data only.
pub struct Engine {
    max_ast_depth: usize,
    python: LanguageSupport,
    javascript: LanguageSupport,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            max_ast_depth: config.limits.max_ast_depth,
            python: LanguageSupport::new(Language::Python, config),
            javascript: LanguageSupport::new(Language::JavaScript, config),
        }
    }

    fn support(&self, language: Language) -> &LanguageSupport {
        match language {
            Language::Python => &self.python,
            Language::JavaScript => &self.javascript,
        }
    }

    pub fn classifier(&self, language: Language) -> &Classifier {
        &self.support(language).classifier
    }

    /// Analyze `code` as `language`
    pub fn analyze(&self, code: &str, language: Language) -> AnalysisResult<Analysis> {
        catch_unwind(AssertUnwindSafe(|| self.run(code, language))).map_err(|panic_info| {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            error!("Analysis of {} input panicked: {}", language, panic_msg);
            AnalysisError::Internal(panic_msg)
        })
    }

    /// Analyze with a textual language selector (`"python"`, `"JS"`, ...)
    pub fn analyze_str(&self, code: &str, language: &str) -> AnalysisResult<Analysis> {
        let language: Language = language.parse()?;
        self.analyze(code, language)
    }

    /// Analyze raw bytes, which must be UTF-8
    pub fn analyze_bytes(&self, bytes: &[u8], language: Language) -> AnalysisResult<Analysis> {
        let code = std::str::from_utf8(bytes).map_err(|e| AnalysisError::InvalidEncoding {
            offset: e.valid_up_to(),
        })?;
        self.analyze(code, language)
    }

    /// Full signal vector without classification
    pub fn extract_signals(&self, code: &str, language: Language) -> SignalVector {
        let sample = SourceSample::new(code);

        let tokens = match lexer::tokenize(code, language) {
            Ok(tokens) => {
                if let Some(last) = tokens.last() {
                    debug!(
                        "Tokenized {} input through line {}, column {}",
                        language, last.line, last.column
                    );
                }
                tokens
            }
            Err(e) => {
                warn!("Tokenization of {} input failed: {}", language, e);
                Vec::new()
            }
        };

        let ast = match parsers::parse(code, language, self.max_ast_depth) {
            Ok(ast) => Some(ast),
            Err(e) => {
                warn!("Parsing of {} input failed: {}", language, e);
                None
            }
        };

        let input = ExtractionInput {
            language,
            sample: &sample,
            tokens: &tokens,
            ast: ast.as_ref(),
        };
        self.support(language).pipeline.run(&input)
    }

    fn run(&self, code: &str, language: Language) -> Analysis {
        let mut signals = self.extract_signals(code, language);
        let classification = self.classifier(language).classify_into(&mut signals);
        debug!(
            "Classified {} lines of {} as {} (p = {:.3})",
            code.lines().count(),
            language,
            classification.verdict,
            classification.probability
        );
        Analysis {
            language,
            classification,
            signals,
        }
    }
}
