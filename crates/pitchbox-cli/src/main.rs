//! pitchbox CLI.
//!
//! Stores pitch videos under a data directory (payload files + a JSON
//! metadata index) and exposes the catalog and a simulated player.

use std::sync::Arc;

use clap::Parser;
use pitchbox_core::impls::{FsBinaryTier, JsonFileIndex};
use pitchbox_core::{App, AppBuilder, PitchboxConfig};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn build_app(cli: &Cli) -> Result<App, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => PitchboxConfig::load(path)?,
        None => PitchboxConfig::default(),
    };
    let binary = FsBinaryTier::new(cli.data_dir.join("blobs"))?;
    let index = JsonFileIndex::new(cli.data_dir.join("index.json"))?;

    let app = AppBuilder::new()
        .config(config)
        .binary_tier(Arc::new(binary))
        .metadata_index(Arc::new(index))
        .build()?;
    Ok(app)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let app = build_app(&cli)?;
    tracing::debug!(data_dir = %cli.data_dir.display(), "storage opened");

    match cli.command {
        Commands::Upload {
            file,
            title,
            description,
            mime_type,
        } => commands::upload(&app, &file, &title, &description, mime_type).await?,
        Commands::List {
            filter,
            query,
            json,
        } => commands::list(&app, filter, query, json)?,
        Commands::Show { id } => commands::show(&app, &id).await?,
        Commands::Export { id, output } => commands::export(&app, &id, &output).await?,
        Commands::Remove { id } => commands::remove(&app, &id).await?,
        Commands::Play {
            id,
            duration,
            steps,
        } => commands::play(&app, &id, duration, &steps).await?,
    }

    Ok(())
}
