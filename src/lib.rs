//! codect - AI-generated code detection
//!
//! ```no_run
//! let analysis = codect::analyze("def add(a, b):\n    return a + b\n", "python")?;
//! println!("{} ({:.2})", analysis.verdict(), analysis.probability());
//! # Ok::<(), codect::AnalysisError>(())
//! ```
//!
//! Layers, bottom-up: [`lexer`] and [`parsers`] turn text into tokens and
//! an owned AST, [`signals`] extracts the per-language signal vector,
//! [`classifier`] scores it, and [`engine`] dispatches by language.

pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod models;
pub mod parsers;
pub mod reporters;
pub mod signals;

pub use engine::Engine;
pub use error::{AnalysisError, AnalysisResult};
pub use models::{Analysis, Classification, Language, SignalValue, SignalVector, Verdict};

use std::sync::OnceLock;

static DEFAULT_ENGINE: OnceLock<Engine> = OnceLock::new();

/// Analyze `code` with the built-in configuration.
///
/// `language` is `"python"` or `"javascript"` (case-insensitive).
pub fn analyze(code: &str, language: &str) -> AnalysisResult<Analysis> {
    DEFAULT_ENGINE
        .get_or_init(Engine::new)
        .analyze_str(code, language)
}
