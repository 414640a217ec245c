use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::dataset::{DEFAULT_COUNT, DEFAULT_START};

/// Medvox operator CLI
#[derive(Parser, Debug)]
#[command(name = "medvox")]
#[command(version)]
#[command(about = "Query patient records and manage the Medvox dataset")]
pub struct Cli {
    /// Environment file to load before reading configuration
    #[arg(long, global = true, default_value = ".env")]
    pub env_file: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Ask questions about patient records interactively
    Query,

    /// Write a synthetic patient dataset
    Generate {
        /// Number of patients
        #[arg(long, default_value_t = DEFAULT_COUNT)]
        count: usize,

        /// Sequence number of the first scan file
        #[arg(long, default_value_t = DEFAULT_START)]
        start: u32,

        /// Output CSV file
        #[arg(long, default_value = "patients.csv")]
        out: PathBuf,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Rewrite the scan_file column sequentially
    Renumber {
        /// Dataset to rewrite in place
        #[arg(long, default_value = "patients.csv")]
        csv: PathBuf,

        /// Sequence number of the first scan file
        #[arg(long, default_value_t = DEFAULT_START)]
        start: u32,
    },

    /// Insert the dataset into the records backend
    Load {
        /// Dataset to load
        #[arg(long, default_value = "patients.csv")]
        csv: PathBuf,

        /// Directory scan file paths are relative to
        #[arg(long, default_value = ".")]
        data_dir: PathBuf,
    },

    /// Verify the speech-to-text credentials
    Check,
}
