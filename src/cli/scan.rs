//! `codect scan`: classify every supported file under a path

use anyhow::{bail, Result};
use codect::engine::Engine;
use codect::models::Language;
use codect::reporters::{self, Detail, OutputFormat, ScanEntry};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub fn run(engine: &Engine, path: &Path, format: &str, mode: &str) -> Result<()> {
    let format: OutputFormat = format.parse()?;
    let detail: Detail = mode.parse()?;

    if !path.exists() {
        bail!("Path does not exist: {}", path.display());
    }

    let files = collect_source_files(path);
    info!("Scanning {} files under {}", files.len(), path.display());

    let entries = scan_files(engine, files);
    println!("{}", reporters::render_scan(&entries, format, detail)?);
    Ok(())
}

/// Supported files under `root`, respecting .gitignore
fn collect_source_files(root: &Path) -> Vec<(PathBuf, Language)> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .build();

    let mut files = Vec::new();
    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let language = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Language::from_extension);
        match language {
            Some(language) => files.push((path.to_path_buf(), language)),
            None => debug!("Skipping {}", path.display()),
        }
    }
    files
}

/// Analyze in parallel; the result is sorted by path
fn scan_files(engine: &Engine, files: Vec<(PathBuf, Language)>) -> Vec<ScanEntry> {
    let mut entries: Vec<ScanEntry> = files
        .into_par_iter()
        .map(|(path, language)| {
            let outcome = std::fs::read(&path)
                .map_err(|e| format!("Failed to read file: {}", e))
                .and_then(|bytes| {
                    engine
                        .analyze_bytes(&bytes, language)
                        .map_err(|e| e.to_string())
                });
            ScanEntry { path, outcome }
        })
        .collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}
