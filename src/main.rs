use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use latam_dashboard::config::AppConfig;
use latam_dashboard::types::{CountryShape, Observation};
use latam_dashboard::{data, page, processing, server};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a static dashboard covering every year in the dataset
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the interactive dashboard
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Render { config } => {
            let app_config = AppConfig::load_from_file(config)?;
            let (aggregated, shapes) = load(&app_config)?;
            let years = processing::distinct_years(&aggregated);
            let selected: BTreeSet<i32> = years.iter().copied().collect();

            let html = page::build_dashboard(&app_config, &aggregated, &shapes, &years, &selected)?;
            fs::write(&app_config.output.html_path, html).with_context(|| {
                format!("Failed to write dashboard: {:?}", app_config.output.html_path)
            })?;
            info!(path = ?app_config.output.html_path, "dashboard written");
        }
        Commands::Serve { config } => {
            let app_config = AppConfig::load_from_file(config)?;
            let (aggregated, shapes) = load(&app_config)?;
            server::start_server(app_config, aggregated, shapes).await?;
        }
    }

    Ok(())
}

/// One-time load for the process: dataset, aggregation, boundaries. Both
/// subcommands start from the same cached view of the inputs.
fn load(config: &AppConfig) -> Result<(Vec<Observation>, Vec<CountryShape>)> {
    let raw = data::load_observations(&config.input.data_csv)?;
    let aggregated = processing::aggregate(&raw);
    let shapes = data::load_boundaries(&config.input.boundaries, &config.input.code_property)?;
    Ok((aggregated, shapes))
}
