//! `codect weights`: show the effective classifier configuration

use anyhow::Result;
use codect::config::EngineConfig;
use codect::models::Language;
use serde_json::json;

pub fn run(config: &EngineConfig, language: &str) -> Result<()> {
    println!("{}", render(config, language.parse()?)?);
    Ok(())
}

fn render(config: &EngineConfig, language: Language) -> Result<String> {
    let classifier = config.classifier(language);
    let report = json!({
        "language": language,
        "settings": classifier.settings(),
        "weights": classifier.weights(),
    });
    Ok(serde_json::to_string_pretty(&report)?)
}
