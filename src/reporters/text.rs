//! Text (terminal) reporter

use super::{Detail, ScanEntry};
use crate::models::{Analysis, SignalValue, Verdict};
use console::style;
use std::fmt::Write;

fn verdict_line(verdict: Verdict) -> String {
    match verdict {
        Verdict::AiGenerated => style(verdict.label()).red().bold().to_string(),
        Verdict::HumanWritten => style(verdict.label()).green().bold().to_string(),
        Verdict::Uncertain => style(verdict.label()).yellow().bold().to_string(),
    }
}

fn format_value(value: &SignalValue) -> String {
    match value {
        SignalValue::Bool(b) => b.to_string(),
        SignalValue::Int(i) => i.to_string(),
        SignalValue::Float(x) => format!("{x:.3}"),
        SignalValue::Label(s) => s.to_string(),
    }
}

pub fn render_analysis(analysis: &Analysis, detail: Detail) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        style("Language:").dim(),
        analysis.language
    );
    let _ = writeln!(
        out,
        "{} {}  ({:.1}% AI)",
        style("Verdict:").dim(),
        verdict_line(analysis.verdict()),
        analysis.probability() * 100.0
    );

    let signals = detail.select(&analysis.signals);
    if !signals.is_empty() {
        out.push('\n');
        let width = signals.keys().map(str::len).max().unwrap_or(0);
        for (name, value) in signals.iter() {
            let _ = writeln!(out, "  {name:<width$}  {}", format_value(value));
        }
    }
    out
}

pub fn render_scan(entries: &[ScanEntry]) -> String {
    let mut out = String::new();
    let mut ai = 0;
    let mut human = 0;
    let mut uncertain = 0;
    let mut failed = 0;

    for entry in entries {
        match &entry.outcome {
            Ok(analysis) => {
                match analysis.verdict() {
                    Verdict::AiGenerated => ai += 1,
                    Verdict::HumanWritten => human += 1,
                    Verdict::Uncertain => uncertain += 1,
                }
                let _ = writeln!(
                    out,
                    "{:>5.1}%  {}  {}",
                    analysis.probability() * 100.0,
                    verdict_line(analysis.verdict()),
                    entry.path.display()
                );
            }
            Err(error) => {
                failed += 1;
                let _ = writeln!(
                    out,
                    "{}  {}  {}",
                    style("  err").red(),
                    entry.path.display(),
                    style(error).dim()
                );
            }
        }
    }

    let _ = writeln!(
        out,
        "\n{} files: {} AI-generated, {} human-written, {} uncertain, {} failed",
        entries.len(),
        ai,
        human,
        uncertain,
        failed
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_analysis;
    use std::path::PathBuf;

    #[test]
    fn test_render_analysis() {
        console::set_colors_enabled(false);
        let out = render_analysis(&test_analysis(), Detail::Detailed);
        assert!(out.contains("Human-Written Code"));
        assert!(out.contains("20.0% AI"));
        assert!(out.contains("has_todo_comments"));
        assert!(out.contains("0.250"));
    }

    #[test]
    fn test_render_scan_summary() {
        console::set_colors_enabled(false);
        let entries = vec![
            ScanEntry {
                path: PathBuf::from("a.py"),
                outcome: Ok(test_analysis()),
            },
            ScanEntry {
                path: PathBuf::from("b.py"),
                outcome: Err("boom".to_string()),
            },
        ];
        let out = render_scan(&entries);
        assert!(out.contains("a.py"));
        assert!(out.contains("boom"));
        assert!(out.contains("2 files: 0 AI-generated, 1 human-written, 0 uncertain, 1 failed"));
    }
}
