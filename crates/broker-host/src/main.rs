use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::signal;

use simple_broker_host::{BrokerConfig, HostServer, telemetry};

#[derive(Debug, Parser)]
#[command(
    name = "simple-broker",
    version,
    about = "PEP 503 simple index backed by GitHub releases"
)]
struct Cli {
    /// YAML file listing the integrations; falls back to GITHUB_* variables
    #[arg(long, env = "BROKER_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (default 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// Port to serve the HTTP server on (default 8000)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = telemetry::init() {
        eprintln!("failed to initialise logging: {err}");
    }
    if let Err(err) = run().await {
        tracing::error!(error = %format!("{err:#}"), "broker failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BrokerConfig::load_from_path(path).context("failed to load broker config")?,
        None => BrokerConfig::from_env(),
    }
    .with_listen(cli.host, cli.port);
    tracing::info!(
        config = ?config.config_path,
        integrations = config.integrations.len(),
        "loaded broker configuration"
    );

    let integrations = config
        .build_integrations()
        .context("failed to configure integrations")?;
    let ip: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("invalid listen host `{}`", config.host))?;
    let addr = SocketAddr::new(ip, config.port);
    let server = HostServer::new(addr, integrations);

    tokio::select! {
        result = server.serve() => {
            result?;
        }
        _ = signal::ctrl_c() => {
            tracing::info!("received shutdown signal");
        }
    }

    Ok(())
}
