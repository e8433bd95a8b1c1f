//! JSON reporter
//!
//! Single analyses print as one compact object so the output can be piped
//! line by line; scans print as a pretty array.

use super::{Detail, ScanEntry};
use crate::models::{Analysis, Language, SignalVector};
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct AnalysisReport {
    result: u8,
    classification: &'static str,
    language: Language,
    features: SignalVector,
}

impl AnalysisReport {
    fn new(analysis: &Analysis, detail: Detail) -> Self {
        Self {
            result: analysis.verdict().as_result(),
            classification: analysis.verdict().label(),
            language: analysis.language,
            features: detail.select(&analysis.signals),
        }
    }
}

#[derive(Serialize)]
struct ScanReport<'a> {
    path: String,
    #[serde(flatten)]
    outcome: ScanOutcome<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ScanOutcome<'a> {
    Analysis(AnalysisReport),
    Error { error: &'a str },
}

pub fn render_analysis(analysis: &Analysis, detail: Detail) -> Result<String> {
    Ok(serde_json::to_string(&AnalysisReport::new(analysis, detail))?)
}

pub fn render_scan(entries: &[ScanEntry], detail: Detail) -> Result<String> {
    let reports: Vec<ScanReport<'_>> = entries
        .iter()
        .map(|entry| ScanReport {
            path: entry.path.display().to_string(),
            outcome: match &entry.outcome {
                Ok(analysis) => ScanOutcome::Analysis(AnalysisReport::new(analysis, detail)),
                Err(error) => ScanOutcome::Error { error },
            },
        })
        .collect();
    Ok(serde_json::to_string_pretty(&reports)?)
}

pub fn render_error(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
