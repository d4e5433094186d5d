use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use csvpage::config::Settings;
use csvpage::content::resolver::ResolutionMode;
use csvpage::{Server, ServerOptions};

#[derive(Debug, Parser)]
#[command(name = "csvpage", version)]
#[command(about = "Serves .html files and random CSV lines from a directory")]
struct Cli {
    /// Port to listen on (1-65535)
    port: Option<String>,

    /// Directory to serve files from
    directory: Option<PathBuf>,

    /// YAML settings file
    #[arg(short, long, env = "CSVPAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Request resolution strategy: extension or segment
    #[arg(short, long)]
    mode: Option<ResolutionMode>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(dir) = cli.directory {
        settings.server.base_directory = dir;
    }
    if let Some(mode) = cli.mode {
        settings.content.resolution = mode;
    }
    let port = cli.port.unwrap_or_else(|| settings.server.port.to_string());

    let mut server = Server::new(ServerOptions::from_settings(&settings));
    server.start(&port, settings.server.base_directory.clone()).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    server.stop().await?;
    Ok(())
}
