//! Error types surfaced by the analysis engine

use thiserror::Error;

/// Errors that escape the engine.
///
/// Tokenizer and parser failures never show up here: they degrade to
/// default signals inside the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Input is not valid UTF-8 (byte offset {offset})")]
    InvalidEncoding { offset: usize },

    #[error("Internal analysis failure: {0}")]
    Internal(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
