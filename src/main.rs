use std::path::PathBuf;

use clap::Parser;
use staticd::config::Config;
use staticd::server;
use tracing_subscriber::EnvFilter;

/// Serve a directory tree over HTTP.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Port number to bind
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Web server home directory
    #[arg(long)]
    home: Option<PathBuf>,

    /// Enable directory listing
    #[arg(long)]
    listdir: bool,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(args: Args) -> anyhow::Result<Config> {
    let mut cfg = Config::load(args.config.as_deref())?;

    if let Some(port) = args.port {
        cfg.set_port(port)?;
    }
    if let Some(home) = args.home {
        cfg.static_files.root = home;
    }
    if args.listdir {
        cfg.static_files.list_directories = true;
    }

    cfg.validate()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = load_config(Args::parse())?;

    tokio::select! {
        res = server::listener::run(&cfg) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
