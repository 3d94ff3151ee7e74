use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use quill_config::{Config, ConfigLoad, ConfigLoader, ConfigWarnings};
use quill_server::{AppState, create_app};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "quill-server")]
#[command(about = "Journal companion API: short, kind reflections on journal entries")]
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

    /// Path to a quill.toml configuration file
    #[arg(short, long, env = "QUILL_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load and validate the configuration, print it with secrets redacted,
    /// and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::CheckConfig) => check_config(&cli.serve),
        None => run_server(cli.serve).await,
    }
}

fn load_config(args: &ServeArgs) -> anyhow::Result<(Config, ConfigWarnings)> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &args.env_file {
        loader = loader.with_env_file(path);
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

    Ok((config, warnings))
}

fn check_config(args: &ServeArgs) -> anyhow::Result<()> {
    let (config, warnings) = load_config(args)?;

    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => eprintln!("warning: {} ({hint})", warning.message),
            None => eprintln!("warning: {}", warning.message),
        }
    }

    let rendered = config
        .to_redacted_toml()
        .context("failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let (config, warnings) = load_config(&args)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "loaded configuration file");
    }

    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => {
                warn!(message = %warning.message, "configuration warning")
            }
        }
    }

    let bind_address = config.server.bind_address();
    info!(
        model = %config.completion.model,
        provider_configured = config.completion.has_api_key(),
        dev_mode = config.dev_mode,
        "starting Quill server on {bind_address}"
    );

    let state = AppState::from_config(config)?;
    let router = create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
