//! Output reporters for analysis results
//!
//! Supports two output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON (`{"result", "classification", "language", "features"}`)
//!
//! Which signals are shown is a presentation choice ([`Detail`]); the engine
//! always computes the full vector.

mod json;
mod text;

use crate::models::{Analysis, SignalVector};
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Signals exposed in basic mode
pub const BASIC_SIGNALS: &[&str] = &["token_entropy", "comment_ratio", "total_lines"];

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// How much of the signal vector to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Detail {
    #[default]
    Basic,
    Detailed,
}

impl FromStr for Detail {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(Detail::Basic),
            "detailed" | "full" => Ok(Detail::Detailed),
            _ => Err(anyhow!("Unknown mode '{}'. Valid modes: basic, detailed", s)),
        }
    }
}

impl Detail {
    pub fn select(&self, signals: &SignalVector) -> SignalVector {
        match self {
            Detail::Basic => signals.subset(BASIC_SIGNALS),
            Detail::Detailed => signals.clone(),
        }
    }
}

/// One file of a directory scan
#[derive(Debug, Clone)]
pub struct ScanEntry {
    pub path: PathBuf,
    pub outcome: std::result::Result<Analysis, String>,
}

pub fn render_analysis(
    analysis: &Analysis,
    format: OutputFormat,
    detail: Detail,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::render_analysis(analysis, detail)),
        OutputFormat::Json => json::render_analysis(analysis, detail),
    }
}

pub fn render_scan(entries: &[ScanEntry], format: OutputFormat, detail: Detail) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::render_scan(entries)),
        OutputFormat::Json => json::render_scan(entries, detail),
    }
}

/// `{"error": message}`
pub fn render_error(message: &str) -> String {
    json::render_error(message)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Classification, Language, SignalValue, Verdict};

    pub(crate) fn test_analysis() -> Analysis {
        let signals: SignalVector = [
            ("token_entropy", SignalValue::Float(3.5)),
            ("comment_ratio", SignalValue::Float(0.25)),
            ("total_lines", SignalValue::Int(4)),
            ("has_todo_comments", SignalValue::Bool(true)),
            ("confidence", SignalValue::Float(0.2)),
        ]
        .into_iter()
        .collect();
        Analysis {
            language: Language::Python,
            classification: Classification {
                verdict: Verdict::HumanWritten,
                probability: 0.2,
            },
            signals,
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("sarif".parse::<OutputFormat>().is_err());
        assert_eq!("detailed".parse::<Detail>().unwrap(), Detail::Detailed);
        assert!("verbose".parse::<Detail>().is_err());
    }

    #[test]
    fn test_basic_detail_selects_three_signals() {
        let analysis = test_analysis();
        let basic = Detail::Basic.select(&analysis.signals);
        let keys: Vec<&str> = basic.keys().collect();
        assert_eq!(keys, vec!["comment_ratio", "token_entropy", "total_lines"]);
        assert_eq!(Detail::Detailed.select(&analysis.signals).len(), 5);
    }
}
