//! Configuration for codect
//!
//! Classifier settings, the AST depth limit and per-language weight
//! overrides, read from `codect.toml`.

mod engine_config;

pub use engine_config::{
    load_config, user_config_path, EngineConfig, Limits, WeightOverrides, PROJECT_CONFIG_FILE,
};
