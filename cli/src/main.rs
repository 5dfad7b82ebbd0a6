//! `differing`: serve a local web UI over the git repository in the current directory.

mod browser;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use differing_config::DifferingConfig;
use differing_core::{RepoService, RepoSettings};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "differing", version, about)]
struct Args {
    /// Address to listen on [default: localhost]
    #[arg(long)]
    addr: Option<String>,

    /// Port to listen on [default: 3844]
    #[arg(long)]
    port: Option<u16>,

    /// Open the web UI in a browser once the server is up
    #[arg(long)]
    open: bool,

    /// Directory inside the repository to serve [default: current directory]
    #[arg(long, value_name = "DIR")]
    repo: Option<PathBuf>,

    /// Config file [default: ~/.differing/config.toml]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the startup banner; logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn load_config(explicit: Option<&PathBuf>) -> Result<DifferingConfig> {
    let loaded = match explicit {
        Some(path) => match DifferingConfig::load_from(path)? {
            Some(config) => Some(config),
            None => bail!("config file not found: {}", path.display()),
        },
        None => DifferingConfig::load()?,
    };
    Ok(loaded.unwrap_or_default())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_ref())?;

    let start_dir = match args.repo {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let service = RepoService::open(&start_dir, RepoSettings::from(&config)).await?;

    let addr = args.addr.unwrap_or_else(|| config.addr().to_string());
    let port = args.port.unwrap_or_else(|| config.port());
    let listener = TcpListener::bind((addr.as_str(), port))
        .await
        .with_context(|| format!("failed to listen on {addr}:{port}"))?;
    let bound = listener.local_addr().context("listener has no local address")?;

    let url = format!("http://{addr}:{}", bound.port());
    println!("differing starting on {addr}:{}", bound.port());
    println!("Open {url} in your browser");
    tracing::info!(%bound, root = %service.root().display(), "listening");

    if args.open || config.open_browser() {
        browser::open_after_delay(url);
    }

    differing_server::serve(listener, Arc::new(service), shutdown_signal())
        .await
        .context("server error")
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
