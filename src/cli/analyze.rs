//! `codect analyze`: classify one snippet

use anyhow::{bail, Context, Result};
use codect::engine::Engine;
use codect::models::{Analysis, Language};
use codect::reporters::{self, Detail, OutputFormat};
use std::io::Read;
use std::path::Path;
use tracing::info;

pub fn run(
    engine: &Engine,
    language: &str,
    mode: &str,
    format: &str,
    file: Option<&Path>,
) -> Result<()> {
    let format: OutputFormat = format.parse()?;
    let detail: Detail = mode.parse()?;

    match analyze_input(engine, language, file)
        .and_then(|analysis| reporters::render_analysis(&analysis, format, detail))
    {
        Ok(rendered) => {
            println!("{}", rendered);
            Ok(())
        }
        Err(e) => {
            let message = format!("{:#}", e);
            match format {
                OutputFormat::Json => println!("{}", reporters::render_error(&message)),
                OutputFormat::Text => eprintln!("error: {}", message),
            }
            std::process::exit(1);
        }
    }
}

fn analyze_input(engine: &Engine, language: &str, file: Option<&Path>) -> Result<Analysis> {
    let language: Language = language.parse()?;
    let bytes = read_source(file)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        bail!("No code provided.");
    }
    info!("Analyzing {} bytes of {}", bytes.len(), language);
    Ok(engine.analyze_bytes(&bytes, language)?)
}

fn read_source(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}
