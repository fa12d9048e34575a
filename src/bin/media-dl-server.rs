//! media-dl server entry point
//!
//! Loads the configuration, installs logging and serves the HTTP API until
//! SIGINT/SIGTERM.

use clap::Parser;
use media_dl::{Config, MediaDownloader, run_with_shutdown};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Stream media downloads from a yt-dlp compatible worker over HTTP
#[derive(Debug, Parser)]
#[command(name = "media-dl-server", version, about)]
struct Cli {
    /// JSON configuration file (defaults are used when omitted)
    #[arg(short, long, env = "MEDIA_DL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured bind address
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Override the configured download directory
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Override the configured worker executable
    #[arg(long)]
    worker: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (RUST_LOG overrides the default filter)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("media_dl=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.api.bind_address = bind;
    }
    if let Some(download_dir) = cli.download_dir {
        config.download.download_dir = download_dir;
    }
    if let Some(worker) = cli.worker {
        config.tools.worker_path = Some(worker);
    }

    let downloader = MediaDownloader::new(config).await?;
    run_with_shutdown(downloader).await?;

    Ok(())
}
