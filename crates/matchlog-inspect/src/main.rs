//! Replay inspector for match logs.
//!
//! Decodes a replay file and prints a JSON summary of its contents, or
//! writes a small deterministic sample replay for testing viewers and
//! other decoders.
//!
//! ```text
//! matchlog-inspect summarize <replay> [--compact]
//! matchlog-inspect sample <out>
//! matchlog-inspect --config other.yaml summarize <replay>
//! ```
//!
//! # Startup Sequence
//!
//! 1. Parse the command line
//! 2. Load configuration from `matchlog.yaml` (or `--config`)
//! 3. Initialize structured logging (tracing)
//! 4. Summarize the replay or write the sample

mod config;
mod error;
mod sample;
mod summary;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::InspectConfig;
use crate::error::InspectError;

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "matchlog.yaml";

/// Replay inspector for match logs
#[derive(Debug, Parser)]
#[command(name = "matchlog-inspect")]
#[command(about = "Summarize replay files and write sample replays")]
#[command(version)]
struct Cli {
    /// Configuration file; defaults are used if it does not exist
    #[arg(long, global = true, default_value = CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Print a JSON summary of a replay
    Summarize {
        /// Replay file to read
        replay: PathBuf,

        /// Print the summary on one line, overriding `pretty` in the config
        #[arg(long)]
        compact: bool,
    },

    /// Write a deterministic sample replay
    Sample {
        /// Output file
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    // 1. Parse the command line.
    let cli = Cli::parse();

    // 2. Load configuration. Logging is not up yet, so remember whether
    //    the file was found and report it once it is.
    let (config, found) = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    // 3. Initialize structured logging. RUST_LOG wins over the config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
    if !found {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    // 4. Run it.
    match cli.command {
        Command::Summarize { replay, compact } => {
            let summary = summary::summarize_file(&replay)
                .with_context(|| format!("failed to summarize {}", replay.display()))?;
            info!(
                rounds = summary.rounds,
                matches = summary.matches.len(),
                corrupt = summary.corrupt,
                "Replay summarized"
            );
            println!("{}", summary::render(&summary, config.pretty && !compact)?);
        }
        Command::Sample { out } => {
            sample::write_sample(&out, &config.builder)
                .with_context(|| format!("failed to write sample to {}", out.display()))?;
        }
    }
    Ok(())
}

/// Load the config file, falling back to defaults when it does not exist.
///
/// The flag reports whether the file was found.
fn load_config(path: &Path) -> Result<(InspectConfig, bool), InspectError> {
    if path.exists() {
        let config = InspectConfig::from_file(path)?;
        Ok((config, true))
    } else {
        Ok((InspectConfig::default(), false))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn summarize_subcommand() {
        let cli = Cli::try_parse_from(["matchlog-inspect", "summarize", "game.replay"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(CONFIG_PATH));
        assert_eq!(
            cli.command,
            Command::Summarize {
                replay: PathBuf::from("game.replay"),
                compact: false,
            }
        );
    }

    #[test]
    fn sample_subcommand_with_config() {
        let cli = Cli::try_parse_from([
            "matchlog-inspect",
            "sample",
            "out.replay",
            "--config",
            "ci.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("ci.yaml"));
        assert_eq!(
            cli.command,
            Command::Sample {
                out: PathBuf::from("out.replay")
            }
        );
    }

    #[test]
    fn compact_flag() {
        let cli =
            Cli::try_parse_from(["matchlog-inspect", "summarize", "--compact", "g.replay"])
                .unwrap();
        assert!(matches!(cli.command, Command::Summarize { compact: true, .. }));
    }

    #[test]
    fn bad_invocations() {
        for args in [
            &["matchlog-inspect"][..],
            &["matchlog-inspect", "sample"][..],
            &["matchlog-inspect", "summarize", "a.replay", "b.replay"][..],
            &["matchlog-inspect", "replay", "a.replay"][..],
        ] {
            assert!(Cli::try_parse_from(args).is_err(), "{args:?}");
        }
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let (config, found) = load_config(Path::new("does-not-exist/matchlog.yaml")).unwrap();
        assert!(!found);
        assert_eq!(config, InspectConfig::default());
    }
}
