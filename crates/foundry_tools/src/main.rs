//! Foundry - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use foundry_tools::scenario::Scenario;

#[derive(Parser)]
#[command(name = "foundry-tools")]
#[command(about = "Development tools for the Foundry production scheduler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a ruleset file, or every ruleset in a directory
    Validate {
        /// Path to a ruleset file or data directory
        #[arg(default_value = "data")]
        path: PathBuf,
    },
    /// Run a scenario headlessly and print a summary
    Run {
        /// Path to the scenario file
        scenario: PathBuf,
        /// Number of ticks to simulate (overrides the scenario)
        #[arg(short, long)]
        ticks: Option<u64>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating rulesets in: {}", path.display());
            let result = if path.is_dir() {
                foundry_tools::validate::validate_data_directory(&path).map(|summaries| {
                    for summary in summaries {
                        println!("{summary}");
                    }
                })
            } else {
                foundry_tools::validate::validate_ruleset_file(&path)
                    .map(|summary| println!("{summary}"))
            };
            match result {
                Ok(()) => tracing::info!("Validation passed"),
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Run {
            scenario,
            ticks,
            json,
        } => {
            let report = Scenario::load(&scenario).and_then(|s| s.run(ticks));
            match report {
                Ok(report) if json => match report.to_json() {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        tracing::error!("Failed to serialize report: {e}");
                        std::process::exit(1);
                    }
                },
                Ok(report) => print!("{report}"),
                Err(e) => {
                    tracing::error!("Scenario failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
