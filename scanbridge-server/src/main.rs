use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Args as ClapArgs, Parser, Subcommand};
use scanbridge_config::{Config, ConfigLoad, ConfigLoader};
use scanbridge_core::PublishStateStore;
use scanbridge_server::{create_app, infra::startup::wire_app_state};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "scanbridge-server")]
#[command(
    about = "Publish endpoints and scan-created notifier for an external scan pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Notify the pipeline about one existing scan and exit
    Trigger(TriggerArgs),
    /// Print the stored publish state and exit
    State,
}

#[derive(ClapArgs, Debug)]
struct TriggerArgs {
    #[arg(long)]
    scan_id: Uuid,

    #[arg(long)]
    tenant_id: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing();
    let config = load_runtime_config(&cli.serve)?;

    match cli.command {
        Some(Command::Trigger(args)) => run_trigger(config, args).await,
        Some(Command::State) => print_state(&config).await,
        None => run_server(config).await,
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = args.config.clone() {
        loader = loader.with_config_path(path);
    }

    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "loaded configuration file");
    }
    for warning in &warnings.items {
        match warning.hint.as_deref() {
            Some(hint) => warn!(hint, "{}", warning.message),
            None => warn!("{}", warning.message),
        }
    }

    Ok(config)
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;

    let state = wire_app_state(config)?;
    let router = create_app(state);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    let addr = listener.local_addr()?;
    info!("Starting scan bridge server on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn run_trigger(config: Config, args: TriggerArgs) -> anyhow::Result<()> {
    let state = wire_app_state(config)?;
    let scan = state
        .scans
        .find_bridge_scan(args.scan_id)
        .await
        .with_context(|| format!("failed to load scan {}", args.scan_id))?
        .ok_or_else(|| anyhow!("scan {} not found", args.scan_id))?;

    if !state.bridge.is_enabled() {
        warn!(
            "scan bridge is disabled; set DJANGO_SCAN_BRIDGE_ENABLED=true to send"
        );
    }
    state.bridge.trigger(&scan, &args.tenant_id).await;
    Ok(())
}

async fn print_state(config: &Config) -> anyhow::Result<()> {
    let store = PublishStateStore::new(config.publish.state_file.clone());
    let document = store.load_document().await;
    let rendered = serde_json::to_string_pretty(&document)
        .context("failed to render publish state")?;
    println!("{rendered}");
    Ok(())
}
