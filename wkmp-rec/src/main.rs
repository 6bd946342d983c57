//! wkmp-rec (Recommendations) - prompt to streamable track list
//!
//! Loads and validates configuration once, runs a single recommendation
//! request and prints the resolved tracks as JSON on stdout.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use wkmp_rec::clients::Collaborators;
use wkmp_rec::{RecConfig, RecommendationError, RecommendationPipeline};

/// Exit status when too few songs survive fusion
const EXIT_INSUFFICIENT_RESULTS: i32 = 2;

/// Log level when neither `RUST_LOG` nor `--log-level` is given
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "wkmp-rec", version, about = "Prompt-driven music recommendations")]
struct Args {
    /// Path to the TOML config (default: ~/.config/wkmp/wkmp-rec.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog access token
    #[arg(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    token: String,

    /// Skip semantic re-rank and AI verification
    #[arg(long)]
    fast: bool,

    /// Skip semantic re-rank only
    #[arg(long)]
    skip_semantic: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Free-text request, e.g. "70s road trip rock"
    prompt: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Tracing comes up before config so load warnings reach stderr
    wkmp_common::logging::init_tracing(startup_log_level(args.log_level.as_deref()))
        .context("Failed to initialize logging")?;

    let mut config = RecConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if args.fast {
        config.pipeline.fast_mode = true;
    }
    if args.skip_semantic {
        config.pipeline.skip_semantic_similarity = true;
    }

    info!(
        "Starting WKMP Recommendations (wkmp-rec) v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!(
        fast_mode = config.pipeline.fast_mode,
        skip_semantic = config.pipeline.skip_semantic_similarity,
        "Pipeline configured"
    );

    let collaborators = Collaborators::from_config(&config).context("Failed to build API clients")?;
    let pipeline = RecommendationPipeline::new(&config, collaborators);

    // Single execution context: concurrency is multiplexed I/O, not threads
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match runtime.block_on(pipeline.generate_recommendations(&args.prompt, &args.token)) {
        Ok(tracks) => {
            let json = serde_json::to_string_pretty(&tracks).context("Failed to serialize tracks")?;
            println!("{}", json);
            Ok(())
        }
        Err(e @ RecommendationError::InsufficientResults { .. }) => {
            error!("{}", e);
            eprintln!("Not enough matching songs for that request. Try a different prompt.");
            std::process::exit(EXIT_INSUFFICIENT_RESULTS);
        }
    }
}

fn startup_log_level(cli_level: Option<&str>) -> &str {
    cli_level.unwrap_or(DEFAULT_LOG_LEVEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_needs_no_config() {
        assert_eq!(startup_log_level(None), "info");
        assert_eq!(startup_log_level(Some("debug")), "debug");
    }

    #[test]
    fn test_args_parse_log_level_and_prompt() {
        let args = Args::try_parse_from([
            "wkmp-rec",
            "--token",
            "abc",
            "--log-level",
            "warn",
            "70s road trip rock",
        ])
        .unwrap();

        assert_eq!(startup_log_level(args.log_level.as_deref()), "warn");
        assert_eq!(args.prompt, "70s road trip rock");
        assert!(args.config.is_none());
    }
}
