//! Command-line definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pitchbox_core::domain::CatalogCategory;

#[derive(Debug, Parser)]
#[command(name = "pitchbox", version, about = "Store, browse and play short pitch videos")]
pub struct Cli {
    /// Directory holding the payload files and the metadata index.
    #[arg(long, global = true, default_value = "pitchbox-data")]
    pub data_dir: PathBuf,

    /// TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level (ignored when RUST_LOG is set).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Save an existing video file as a new pitch.
    Upload {
        file: PathBuf,
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Override the MIME type guessed from the file extension.
        #[arg(long)]
        mime_type: Option<String>,
    },

    /// List saved pitches.
    List {
        #[arg(short, long, default_value = "all", value_parser = parse_category)]
        filter: CatalogCategory,
        /// Case-insensitive text matched against title and description.
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Show one pitch.
    Show { id: String },

    /// Write a pitch's video bytes to a file.
    Export { id: String, output: PathBuf },

    /// Delete a pitch and its video.
    Remove { id: String },

    /// Drive a simulated player over a stored pitch.
    ///
    /// Steps are comma separated: a key name (`space`, `k`, `m`, `f`,
    /// `ArrowLeft`, `ArrowRight`), `wait:<secs>` or `seek:<fraction>`.
    Play {
        id: String,
        /// Length of the simulated media in seconds.
        #[arg(long, default_value_t = 30.0)]
        duration: f64,
        #[arg(long, value_delimiter = ',', default_value = "space,wait:5")]
        steps: Vec<String>,
    },
}

fn parse_category(raw: &str) -> Result<CatalogCategory, String> {
    raw.parse()
}
