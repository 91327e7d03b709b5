use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use codepulse::config::CodepulseConfig;
use codepulse::http::{app, HttpServer};
use codepulse::store;

/// Command-line arguments. Flags override values from the config file.
#[derive(Parser, Debug)]
#[command(name = "codepulse")]
#[command(version, about = "HTTP backend with per-client fixed-window rate limiting")]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Requests allowed per client per window
    #[arg(long)]
    max_requests: Option<u64>,

    /// Rate limit window in seconds
    #[arg(long)]
    window_secs: Option<u64>,

    /// SQLite database for recorded visits
    #[arg(long)]
    database: Option<PathBuf>,

    /// Emit log records as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<CodepulseConfig> {
        let mut config = match &self.config {
            Some(path) => CodepulseConfig::from_file(path)?,
            None => CodepulseConfig::default(),
        };

        if let Some(listen) = self.listen {
            config.server.listen_addr = listen;
        }
        if let Some(max_requests) = self.max_requests {
            config.rate_limiting.max_requests_per_window = max_requests;
        }
        if let Some(window_secs) = self.window_secs {
            config.rate_limiting.window_secs = window_secs;
        }
        if let Some(database) = &self.database {
            config.storage.database_path = Some(database.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    info!("Starting Codepulse");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = args.load_config()?;
    info!(
        listen_addr = %config.server.listen_addr,
        max_requests_per_window = config.rate_limiting.max_requests_per_window,
        window_secs = config.rate_limiting.window_secs,
        "Configuration loaded"
    );

    let store = store::open(&config.storage)?;
    let router = app(&config, store)?;
    let server = HttpServer::bind(config.server.listen_addr, router).await?;

    server.serve_with_shutdown(shutdown_signal()).await?;

    info!("Codepulse stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or on SIGTERM where available.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal as unix_signal, SignalKind};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = sigterm.recv() => info!("SIGTERM received, draining connections"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM, only Ctrl+C stops the server");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C received, draining connections"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
