use anyhow::{anyhow, Result};
use clap::Parser;
use colored::Colorize;

use logger_redacted::{init_tracing, LoggingConfig};
use ops_cli::{commands, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing file is fine; variables may come from the environment
    let _ = dotenvy::from_filename(&cli.env_file);

    let mut logging = LoggingConfig::from_env(cli.verbose).with_crate("ops_cli");
    if !cli.verbose {
        // Keep the interactive output readable
        logging.log_level = "warn".to_string();
    }
    init_tracing(&logging).map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    if let Err(e) = commands::run(cli.command).await {
        eprintln!("{} {:#}", "Error:".bright_red(), e);
        std::process::exit(1);
    }
    Ok(())
}
