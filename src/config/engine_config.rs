//! Engine configuration
//!
//! Loaded from the first file found in this order:
//! 1. an explicit path (`--config FILE` or `$CODECT_CONFIG` on the CLI)
//! 2. `./codect.toml`
//! 3. `~/.config/codect/config.toml`
//!
//! ```toml
//! [classifier]
//! temperature = 10.0
//! ai_threshold = 0.7
//! human_threshold = 0.3
//!
//! [limits]
//! max_ast_depth = 1000
//!
//! [weights.python]
//! has_todo_comments = -3.0
//!
//! [weights.javascript]
//! uses_jquery = -0.5
//! ```

use crate::classifier::{Classifier, ClassifierSettings, WeightTable};
use crate::models::Language;
use crate::parsers::DEFAULT_MAX_AST_DEPTH;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const PROJECT_CONFIG_FILE: &str = "codect.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: ClassifierSettings,
    pub limits: Limits,
    pub weights: WeightOverrides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Limits {
    /// Deeper syntax trees are treated as parse failures
    pub max_ast_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_ast_depth: DEFAULT_MAX_AST_DEPTH,
        }
    }
}

/// Per-language weight overrides, merged over the built-in tables
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WeightOverrides {
    pub python: BTreeMap<String, f64>,
    pub javascript: BTreeMap<String, f64>,
}

impl WeightOverrides {
    pub fn for_language(&self, language: Language) -> &BTreeMap<String, f64> {
        match language {
            Language::Python => &self.python,
            Language::JavaScript => &self.javascript,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.classifier;
        if !(c.temperature.is_finite() && c.temperature > 0.0) {
            bail!("classifier.temperature must be positive, got {}", c.temperature);
        }
        if !(0.0..=1.0).contains(&c.human_threshold)
            || !(0.0..=1.0).contains(&c.ai_threshold)
            || c.human_threshold > c.ai_threshold
        {
            bail!(
                "classifier thresholds must satisfy \
                 0 <= human_threshold <= ai_threshold <= 1, got {} and {}",
                c.human_threshold,
                c.ai_threshold
            );
        }
        if self.limits.max_ast_depth == 0 {
            bail!("limits.max_ast_depth must be at least 1");
        }
        for language in Language::all() {
            for (name, weight) in self.weights.for_language(language) {
                if !weight.is_finite() {
                    bail!("weights.{language}.{name} must be a finite number");
                }
            }
        }
        Ok(())
    }

    /// Built-in table of `language` with the configured overrides applied
    pub fn weight_table(&self, language: Language) -> WeightTable {
        WeightTable::for_language(language).with_overrides(self.weights.for_language(language))
    }

    pub fn classifier(&self, language: Language) -> Classifier {
        Classifier::with_settings(self.weight_table(language), self.classifier)
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("codect").join("config.toml"))
}

/// Load the configuration from the standard locations.
///
/// An explicit file must load; the implicit project and user files are
/// skipped with a warning when broken.
pub fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    let implicit = [Some(PathBuf::from(PROJECT_CONFIG_FILE)), user_config_path()];
    resolve(explicit, implicit.iter().flatten())
}

fn resolve<'a>(
    explicit: Option<&Path>,
    implicit: impl IntoIterator<Item = &'a PathBuf>,
) -> Result<EngineConfig> {
    if let Some(path) = explicit {
        let config = load_file(path)?;
        debug!("Loaded config from {}", path.display());
        return Ok(config);
    }

    for path in implicit {
        if !path.exists() {
            continue;
        }
        match load_file(path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                return Ok(config);
            }
            Err(e) => warn!("Ignoring config {}: {:#}", path.display(), e),
        }
    }

    debug!("No config file found, using defaults");
    Ok(EngineConfig::default())
}

fn load_file(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    EngineConfig::from_toml_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))
}
