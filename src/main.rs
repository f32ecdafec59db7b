use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use learncontext::{AggregationCoordinator, ContextConfig, logging};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "learncontext")]
#[command(about = "Location, weather and news context for English learning", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "LEARNCONTEXT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a snapshot and print it as JSON
    Snapshot {
        /// Seconds to wait for background completion before printing the final state
        #[arg(short, long, default_value = "0")]
        wait: u64,
    },
    /// Probe every provider
    Health,
    /// Print learning suggestions for the current context
    Recommend,
    /// Print vocabulary totals and active services
    Stats,
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

// Callbacks must not overtake the foreground result
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ContextConfig::load_from_path(cli.config).context("Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose)?;

    let coordinator =
        AggregationCoordinator::from_config(&config).context("Failed to create providers")?;
    let cancel = CancellationToken::new();

    match cli.command {
        Commands::Snapshot { wait } => {
            let snapshot = coordinator.get_fast(&cancel).await?;
            info!(
                partial = snapshot.is_partial,
                default = snapshot.is_default,
                "Snapshot ready"
            );

            if wait == 0 {
                print_json(&snapshot)?;
            } else {
                let waited =
                    tokio::time::timeout(Duration::from_secs(wait), coordinator.wait_for_background())
                        .await;
                if waited.is_err() {
                    warn!("Background work still running after {wait}s");
                }
                print_json(&serde_json::json!({
                    "initial": snapshot,
                    "latest": coordinator.cached(),
                    "status": coordinator.status(),
                }))?;
            }
        }
        Commands::Health => {
            let health = coordinator.check_health(&cancel).await?;
            print_json(&health)?;
        }
        Commands::Recommend => {
            coordinator.preload(&cancel).await;
            print_json(&coordinator.recommendations())?;
        }
        Commands::Stats => {
            coordinator.preload(&cancel).await;
            let waited =
                tokio::time::timeout(Duration::from_secs(10), coordinator.wait_for_background())
                    .await;
            if waited.is_err() {
                warn!("Background work still running, stats may be partial");
            }
            let stats = coordinator.learning_stats(&cancel).await?;
            print_json(&serde_json::json!({
                "stats": stats,
                "news_learning": coordinator.cached().news.learning_content(),
            }))?;
        }
    }

    coordinator.shutdown().await;
    Ok(())
}
