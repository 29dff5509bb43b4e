//! 命令行工具：监听一个服务的健康实例并打印变化

use std::sync::Arc;
use anyhow::Context;
use clap::Parser;
use tracing::info;

use flare_health_watch::logging::init_tracing;
use flare_health_watch::{AddressSet, ConsulHttpTransport, HealthWatcher, WatcherConfig};

/// Watch healthy Consul instances of a service
#[derive(Parser, Debug)]
#[command(name = "flare-health-watch")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    CONSUL_HTTP_ADDR     Consul address when no config file is given (default: http://localhost:8500)
    CONSUL_HTTP_TOKEN    ACL token
    CONSUL_DATACENTER    Datacenter
    RUST_LOG             Log filter (default: info)
"#)]
struct Cli {
    /// Service name to watch
    #[arg(short, long)]
    service: String,

    /// TOML config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => WatcherConfig::load_from_file(path)
            .with_context(|| format!("loading config from {}", path))?,
        None => WatcherConfig::from_env(),
    };

    let transport = Arc::new(ConsulHttpTransport::new(&config)?);
    let watcher = HealthWatcher::start(transport, &config, cli.service.clone());
    watcher.set_subscriber(|addresses: &AddressSet| {
        let mut list: Vec<String> = addresses.iter().map(|a| a.to_string()).collect();
        list.sort();
        info!(count = list.len(), addresses = ?list, "Healthy instances");
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received (Ctrl+C)");
    watcher.shutdown().await;
    Ok(())
}
