//! calico-api - Radio Calico backend
//!
//! Serves the REST API and offers database maintenance and endpoint
//! diagnostics as subcommands.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use calico_api::services::probe::{probe_endpoint, ProbeBody};
use calico_api::services::MetadataClient;
use calico_api::{build_router, db, AppState};
use calico_common::config::{load_config, resolve_config_path, TomlConfig};
use calico_common::db::init_database;

/// Command-line arguments for calico-api
#[derive(Parser, Debug)]
#[command(name = "calico-api")]
#[command(about = "Radio Calico REST API")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "CALICO_CONFIG")]
    config: Option<PathBuf>,

    /// sqlx database URL (overrides the config file)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Address to listen on (overrides the config file)
    #[arg(short, long, env = "CALICO_BIND")]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Create the database schema and exit
    InitDb,
    /// Replace all data with sample users and posts
    SeedDb,
    /// Fetch a metadata endpoint and report any track fields it exposes
    Probe {
        url: String,
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())
        .context("Failed to load configuration")?
        .with_overrides(args.database_url, args.bind);

    init_tracing(&config);

    info!(
        "Starting calico-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match resolve_config_path(args.config.as_deref()) {
        Some(path) => info!("Configuration file: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::InitDb => {
            init_database(&config.database_url).await?;
            info!("Database initialized");
            Ok(())
        }
        Command::SeedDb => {
            let pool = init_database(&config.database_url).await?;
            db::seed::seed_database(&pool).await?;
            Ok(())
        }
        Command::Probe { url, timeout_secs } => probe(&url, Duration::from_secs(timeout_secs)).await,
    }
}

fn init_tracing(config: &TomlConfig) {
    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "calico_api={level},calico_common={level},tower_http={level}",
                    level = level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config: TomlConfig) -> Result<()> {
    let pool = init_database(&config.database_url)
        .await
        .context("Failed to initialize database")?;

    let metadata = MetadataClient::from_config(&config.metadata)
        .context("Failed to build metadata client")?;
    info!(
        "Now playing source: {} ({} history candidates)",
        config.metadata.now_playing_url,
        config.metadata.history_urls.len()
    );

    let state = AppState::new(pool, metadata);
    let app = build_router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("calico-api listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/api/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn probe(url: &str, timeout: Duration) -> Result<()> {
    println!("Testing endpoint: {}", url);

    let report = probe_endpoint(url, timeout)
        .await
        .with_context(|| format!("Could not fetch {}", url))?;

    println!("Status Code: {}", report.status);
    println!(
        "Content-Type: {}",
        report.content_type.as_deref().unwrap_or("N/A")
    );

    match &report.body {
        ProbeBody::Json(value) => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        ProbeBody::Text(text) => {
            println!("Response is not valid JSON:\n{}", text);
            return Ok(());
        }
    }

    let findings = report.findings();
    if findings.is_empty() {
        println!("No obvious track metadata fields found.");
        return Ok(());
    }

    for (category, matches) in findings {
        println!("\nFound {}:", category.to_uppercase());
        for (path, value) in matches {
            println!("  {}: {}", path, value);
        }
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
