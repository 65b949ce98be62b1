use std::sync::Arc;

use cad_backend::{config, create_app, AppState, InMemoryHistory};
use dxf_generator::DxfGenerator;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Floorplan CAD Server");

    let (app_config, generator_config) = match config::load_from_env() {
        Ok(configs) => configs,
        Err(e) => {
            error!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    info!(
        "Using model {} via {} (max tokens: {})",
        generator_config.default_model, generator_config.base_url, generator_config.max_tokens
    );

    let generator = DxfGenerator::new(&generator_config);
    let addr = app_config.bind_addr.clone();
    let state = AppState::new(app_config, generator, Arc::new(InMemoryHistory::new()))?;

    let app = create_app(Arc::new(state));

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
