//! CLI command definitions and handlers

mod analyze;
mod scan;
mod weights;

use anyhow::Result;
use clap::{Parser, Subcommand};
use codect::config::load_config;
use codect::engine::Engine;
use std::path::PathBuf;

/// codect - tell AI-generated code from human-written code
#[derive(Parser, Debug)]
#[command(name = "codect")]
#[command(
    version,
    about = "Heuristic detector for AI-generated Python and JavaScript code",
    after_help = "\
Examples:
  codect analyze -l python snippet.py          JSON verdict with every signal
  cat app.js | codect analyze -l js -m basic   Verdict plus entropy, comments, lines
  codect scan src/ --format json               Classify every .py/.js file under src/
  codect weights -l javascript                 Show the effective weight table"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(
        long,
        global = true,
        default_value = "warn",
        value_parser = ["error", "warn", "info", "debug", "trace"]
    )]
    pub log_level: String,

    /// Config file (default: ./codect.toml, then ~/.config/codect/config.toml)
    #[arg(long, global = true, env = "CODECT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify one snippet read from FILE or stdin
    Analyze {
        /// Language of the snippet: python or javascript
        #[arg(long, short = 'l')]
        language: String,

        /// Signals to include: basic (entropy, comments, lines) or detailed (all)
        #[arg(long, short = 'm', default_value = "detailed", value_parser = ["basic", "detailed"])]
        mode: String,

        /// Output format: json or text
        #[arg(long, short = 'f', default_value = "json", value_parser = ["json", "text"])]
        format: String,

        /// Source file (default: stdin)
        file: Option<PathBuf>,
    },

    /// Classify every Python and JavaScript file under a directory
    Scan {
        /// Directory or file to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format: text or json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Signals to include in JSON output: basic or detailed
        #[arg(long, short = 'm', default_value = "basic", value_parser = ["basic", "detailed"])]
        mode: String,
    },

    /// Print the effective classifier settings and weight table
    Weights {
        /// python or javascript
        #[arg(long, short = 'l')]
        language: String,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            language,
            mode,
            format,
            file,
        } => {
            let engine = Engine::with_config(&config);
            analyze::run(&engine, &language, &mode, &format, file.as_deref())
        }

        Commands::Scan { path, format, mode } => {
            let engine = Engine::with_config(&config);
            scan::run(&engine, &path, &format, &mode)
        }

        Commands::Weights { language } => weights::run(&config, &language),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::try_parse_from(["codect", "analyze", "-l", "python"]).unwrap();
        match cli.command {
            Commands::Analyze {
                mode, format, file, ..
            } => {
                assert_eq!(mode, "detailed");
                assert_eq!(format, "json");
                assert!(file.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_config_reads_environment() {
        let cmd = Cli::command();
        let config = cmd
            .get_arguments()
            .find(|a| a.get_id() == "config")
            .expect("config argument");
        assert_eq!(config.get_env(), Some(std::ffi::OsStr::new("CODECT_CONFIG")));
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        assert!(Cli::try_parse_from(["codect", "analyze", "-l", "js", "-m", "full"]).is_err());
    }
}
