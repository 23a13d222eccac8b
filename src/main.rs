use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use clap_serde_derive::ClapSerde;
use tokio::net::TcpListener;
use tracing::{error, info};

use text_structurer::api::{self, AppState};
use text_structurer::config::Config;
use text_structurer::inference::openai::OpenAiCompatibleClient;
use text_structurer::inference::service::StructurerService;
use text_structurer::telemetry;

const DEFAULT_CONFIG_FILE: &str = "TextStructurer.toml";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env, default_value = DEFAULT_CONFIG_FILE)]
    config_file: String,

    /// Configuration options
    #[command(flatten)]
    pub opt_config: <Config as ClapSerde>::Opt,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = match Config::from_toml(&args.config_file) {
        Ok(conf) => conf.merge(args.opt_config),
        // Only the default file may be absent
        Err(_) if args.config_file == DEFAULT_CONFIG_FILE => {
            Config::default().merge(args.opt_config)
        }
        Err(err) => {
            return Err(err).with_context(|| {
                format!("Failed to read configuration file {}", args.config_file)
            })
        }
    };

    let otlp_endpoint = config.otlp_endpoint();
    telemetry::init_telemetry(otlp_endpoint.as_deref(), config.console)?;

    let backend_config = config.backend();
    info!(
        backend_url = %backend_config.base_url,
        model = %backend_config.model,
        "Using LLM backend"
    );
    let backend = Arc::new(OpenAiCompatibleClient::new(backend_config));
    let structurer = Arc::new(StructurerService::new(backend));
    let router = api::router(AppState::new(structurer, config.request_timeout()));

    let listener = TcpListener::bind(format!("{}:{}", config.address, config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down..."),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
