use anyhow::Context;
use clap::{ArgAction, Parser};
use plex_proxy_config::{EnvTokenProvider, FetchTuning, ServiceConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod logging;
mod routes;

use routes::AppState;

#[derive(Parser)]
#[command(name = "shelfproxy")]
#[command(about = "Plex library aggregation proxy for the discovery front-end")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,

    /// Bind address (overrides SHELFPROXY_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides SHELFPROXY_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Write logs to this file with daily rotation instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    let config = ServiceConfig::from_env();
    let host = cli.host.unwrap_or(config.host);
    let port = cli.port.unwrap_or(config.port);

    let state = AppState {
        settings: config.plex,
        tuning: FetchTuning::default(),
        tokens: Arc::new(EnvTokenProvider::new()),
    };

    let app = routes::build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("shelfproxy listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
