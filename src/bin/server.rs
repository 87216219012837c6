use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use usergate::app;
use usergate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "usergate")]
#[command(about = "User-management service with bearer-token authorization", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "USERGATE_CONFIG_PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load(args.config.as_deref())?;

    if let Err(e) = config.validate() {
        error!("configuration validation failed: {e}");
        return Err(format!("invalid configuration: {e}").into());
    }

    info!(
        environment = ?config.environment,
        rpc_port = config.rpc_port,
        rest_port = config.rest_port,
        "configuration loaded"
    );

    if config.metrics.enabled {
        let metrics_addr = config.metrics.addr();
        tokio::spawn(async move {
            if let Err(e) = metrics_exporter_prometheus::PrometheusBuilder::new()
                .with_http_listener(metrics_addr)
                .install()
            {
                error!("failed to start metrics exporter: {e}");
            } else {
                info!("metrics exporter listening on {metrics_addr}");
            }
        });
    }

    app::run(config).await?;

    info!("server stopped");
    Ok(())
}
