use clap::Parser;
use colored::Colorize;
use std::net::SocketAddr;
use tracing::{error, info};

use error_common::{log_error, MedvoxError, Result};
use logger_redacted::{init_tracing, LogFormat, LoggingConfig};
use medvox_server::{create_app, AppState, ServerConfig};

/// Medvox HTTP Server
#[derive(Parser, Debug)]
#[command(name = "medvox-server")]
#[command(about = "Voice-driven patient record lookup over HTTP")]
struct Args {
    /// Server bind address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Server port
    #[arg(short, long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Environment file to load before reading configuration
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // A missing file is fine; variables may come from the environment
    let env_loaded = dotenvy::from_filename(&args.env_file).is_ok();

    let logging = LoggingConfig::from_env(args.verbose);
    init_tracing(&logging).map_err(|e| MedvoxError::ServerError(format!("Failed to initialize logging: {}", e)))?;
    if logging.ansi && logging.format == LogFormat::Pretty {
        print_startup_banner();
    }

    info!("🏥 {}", "Starting Medvox HTTP Server".bright_cyan());
    info!("📋 Version: {}", env!("CARGO_PKG_VERSION").bright_white());
    if env_loaded {
        info!("📄 Loaded environment from {}", args.env_file);
    }

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ {}: {}", "Configuration failed".bright_red(), e);
            error!("   {}", "Please check your .env file and environment variables".bright_yellow());
            return Err(e);
        }
    };

    let state = AppState::from_config(&config).inspect_err(|e| log_error("startup", e))?;
    let app = create_app(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|e| MedvoxError::ServerError(format!("Invalid bind address {}:{}: {}", args.host, args.port, e)))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| MedvoxError::ServerError(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("🚀 {}", format!("Medvox server running on http://{}", addr).bright_green());
    info!("📋 {}", format!("Health check available at: http://{}/health", addr).bright_blue());
    info!("🎙️  {}", format!("Audio queries: POST http://{}/get_data", addr).bright_blue());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| MedvoxError::ServerError(format!("HTTP server error: {}", e)))?;

    info!("👋 {}", "Medvox server stopped".bright_white());
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}

fn print_startup_banner() {
    println!("{}", "╔══════════════════════════════════════════════════════════════╗".bright_cyan());
    println!("{}", "║                        🏥 MEDVOX                             ║".bright_cyan());
    println!("{}", "║              Voice-Driven Patient Record Lookup              ║".bright_cyan());
    println!("{}", "╚══════════════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}
