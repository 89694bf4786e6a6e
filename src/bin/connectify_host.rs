//! HTTP host for the connectify relationship directory.
//!
//! Usage: `connectify-host [--config <path>]`
//!
//! Configuration comes from the TOML file (explicit path, or
//! `~/.config/connectify/config.toml` if present) followed by `CONNECTIFY_*`
//! environment overrides. Tracing output goes to stderr.

use std::path::PathBuf;

use anyhow::Context;
use connectify::config::ConnectifyConfig;
use connectify::server::ConnectifyServer;
use connectify::startup::build_directory;

fn config_arg() -> anyhow::Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    let mut path = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let value = args.next().context("--config requires a path")?;
                path = Some(PathBuf::from(value));
            }
            other => anyhow::bail!("unrecognized argument: {other}"),
        }
    }
    Ok(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = config_arg()?;
    let config = ConnectifyConfig::load(config_path.as_deref()).context("loading config")?;
    let directory = build_directory(&config).map_err(|e| {
        tracing::error!(error = %e, "connectify-host failed to start");
        anyhow::anyhow!("startup failed: {e}")
    })?;

    let server = ConnectifyServer::start(directory, &config.server).await?;
    tracing::info!(addr = %server.addr(), "connectify-host ready");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    server.shutdown();
    tracing::info!("connectify-host shut down cleanly");
    Ok(())
}
