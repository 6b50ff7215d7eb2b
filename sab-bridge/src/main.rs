//! sab-bridge - acoustic measurement bridge service
//!
//! Serves the bridge operations over HTTP, or runs one of them once and
//! prints the result as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sab_bridge::settings::{BridgeSettings, SettingsOverrides};
use sab_bridge::{build_router, AppState, BridgeState};
use sab_common::config::{config_file_path, load_toml_config_or_default, CompiledDefaults};

/// Command-line arguments for sab-bridge
#[derive(Parser, Debug)]
#[command(name = "sab-bridge")]
#[command(about = "Acoustic measurement bridge and alignment analysis service")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, env = "SAB_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SAB_PORT")]
    port: Option<u16>,

    /// TOML config file (overrides the default location)
    #[arg(short, long, env = "SAB_CONFIG")]
    config: Option<PathBuf>,

    /// Retained measurements (0 = unbounded)
    #[arg(long, env = "SAB_HISTORY_CAPACITY")]
    history_capacity: Option<usize>,

    /// Per-file read timeout in milliseconds
    #[arg(long, env = "SAB_READ_TIMEOUT_MS")]
    read_timeout_ms: Option<u64>,

    /// Seed for synthesized measurement noise
    #[arg(long, env = "SAB_SEED")]
    seed: Option<u64>,

    /// Synthesize noise-free measurements
    #[arg(long, env = "SAB_NO_JITTER")]
    no_jitter: bool,

    /// Search only this directory for measurement files
    #[arg(long, env = "SAB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "sab_bridge=debug,tower_http=info"
    #[arg(long, env = "SAB_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Print one alignment report
    Report,
    /// Print candidate measurement files
    Files,
    /// Probe for the capture software and print the result
    Status,
}

impl Args {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            host: self.host.clone(),
            port: self.port,
            history_capacity: self.history_capacity,
            read_timeout_ms: self.read_timeout_ms,
            seed: self.seed,
            no_jitter: self.no_jitter,
            data_dir: self.data_dir.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

/// Bare levels apply to the bridge crates and request tracing alike
fn filter_directive(level: &str) -> String {
    if level.contains('=') {
        level.to_string()
    } else {
        format!("sab_bridge={0},sab_common={0},tower_http={0}", level)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(config_file_path);
    let toml = load_toml_config_or_default(config_path.as_deref());
    let settings = BridgeSettings::resolve(
        args.overrides(),
        toml,
        CompiledDefaults::for_current_platform(),
    );

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter_directive(&settings.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting sab-bridge v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }

    let bridge = settings.build_state();
    info!(
        "Data path: {} (history capacity {}, jitter {})",
        bridge.discovery().data_path().display(),
        settings.history_capacity,
        if settings.jitter { "on" } else { "off" }
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&settings, bridge).await,
        Command::Report => {
            let snapshot = bridge
                .get_alignment_report()
                .await
                .context("Alignment analysis failed")?;
            print_json(&snapshot)
        }
        Command::Files => print_json(&bridge.list_candidate_files().await),
        Command::Status => print_json(&bridge.connect().await),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

async fn serve(settings: &BridgeSettings, bridge: BridgeState) -> Result<()> {
    let addr = settings
        .socket_addr()
        .context("Invalid listen address")?;
    let app = build_router(AppState::new(bridge));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("sab-bridge listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
