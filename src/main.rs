use anyhow::{Context, Result};
use clap::Parser;
use consommation::adapters::{load_model, start_api_server, SmokeClient};
use consommation::cli::{Cli, Commands};
use consommation::config::AppConfig;
use consommation::error::ServiceError;
use std::time::Duration;
use tracing::{error, info};

mod main_runtime;

use main_runtime::{init_logging, init_logging_simple};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config))?;

    let command = cli.command.unwrap_or(Commands::Serve {
        port: None,
        model: None,
    });

    match command {
        Commands::Serve { port, model } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(tag) = model {
                config.model.tag = tag;
            }
            config.validate().map_err(ServiceError::InvalidConfig)?;
            init_logging(&config.logging);
            run_serve(&config)
        }
        Commands::Smoke { url } => {
            init_logging_simple();
            let url = url.unwrap_or_else(|| config.smoke.url.clone());
            runtime(1)?.block_on(run_smoke(&url, config.server.request_timeout()))
        }
        Commands::Inspect { model } => {
            init_logging_simple();
            if let Some(tag) = model {
                config.model.tag = tag;
            }
            let loaded = load_model(&config.model)
                .with_context(|| format!("failed to load model {}", config.model.tag))?;
            println!("{}", serde_json::to_string_pretty(&loaded.info)?);
            Ok(())
        }
    }
}

fn runtime(worker_threads: usize) -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads.max(1))
        .enable_all()
        .build()
        .context("failed to build tokio runtime")
}

fn run_serve(config: &AppConfig) -> Result<()> {
    // No model, no listener.
    let model = match load_model(&config.model) {
        Ok(model) => model,
        Err(e) => {
            error!(tag = %config.model.tag, error = %e, "model load failed, refusing to start");
            return Err(e).with_context(|| format!("failed to load model {}", config.model.tag));
        }
    };

    info!(cpu = config.server.cpu, "starting runtime");
    runtime(config.server.cpu)?
        .block_on(start_api_server(&config.server, model))
        .context("API server stopped with an error")
}

async fn run_smoke(url: &str, timeout: Duration) -> Result<()> {
    let client = SmokeClient::new(url, timeout)?;
    let result = client
        .run()
        .await
        .with_context(|| format!("smoke request to {url} failed"))?;

    println!("Status code: {}", result.status.as_u16());
    println!("Response: {}", result.body);
    Ok(())
}
