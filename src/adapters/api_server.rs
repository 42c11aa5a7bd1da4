use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::api::{create_router, AppState};
use crate::config::{ModelConfig, ServerConfig};
use crate::error::Result;
use crate::ml::{LoadedModel, ModelRegistry, ModelTag};

/// Load the configured model from the registry.
///
/// Called once before the listener binds; any error here is fatal.
pub fn load_model(config: &ModelConfig) -> Result<LoadedModel> {
    let tag: ModelTag = config.tag.parse()?;
    let registry = ModelRegistry::new(&config.registry_dir);
    info!(
        tag = %tag,
        registry = %registry.root().display(),
        "loading model"
    );
    registry.load(&tag)
}

/// Serve `model` until Ctrl+C / SIGTERM
pub async fn start_api_server(server: &ServerConfig, model: LoadedModel) -> Result<()> {
    let model_tag = model.tag();
    let app = create_router(AppState::new(model), server.request_timeout());

    let addr = server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        addr = %listener.local_addr()?,
        model = %model_tag,
        timeout_secs = server.request_timeout_secs,
        "prediction server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("prediction server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
