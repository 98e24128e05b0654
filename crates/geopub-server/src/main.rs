use clap::Parser;
use geopub_core::{GeoServerConfig, GeoServerManager};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "geopub-server", about = "Shapefile publishing endpoint for GeoServer")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 8090)]
    port: u16,

    /// Configuration file (defaults to $GEOPUB_CONFIG or ~/.config/geopub/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => GeoServerConfig::load(path),
        None => GeoServerConfig::load_default(),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            error!("configuration: {e}");
            return ExitCode::from(2);
        }
    };

    let addr = format!("0.0.0.0:{}", cli.port);
    info!("starting geopub-server on {addr}");
    info!(
        "publishing to {} (vector workspace {})",
        config.server.url,
        config.vector_workspace()
    );

    let manager = Arc::new(GeoServerManager::new(config));
    if let Err(e) = geopub_server::run_server(&manager, &addr) {
        error!("server failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
