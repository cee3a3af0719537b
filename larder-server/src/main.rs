//! Larder Server binary

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use larder_ai::{LlmClient, RecipeGenerator};
use larder_server::{app, AppState, ServerConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Set up logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServerConfig::from_env()?;

    let mut client = LlmClient::new(config.provider.clone());
    if let Some(timeout) = config.ai_timeout {
        client = client.with_timeout(timeout);
    }
    let generator = RecipeGenerator::new(Arc::new(client));
    let state = Arc::new(AppState::new(generator));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Recipe API running on {}", addr);
    info!(
        "Using model: {} via {}",
        config.provider.model(),
        config.provider.label()
    );
    info!("  GET  /                - Health check");
    info!("  POST /api/recipe      - Generate recipe from ingredients");
    info!("  POST /api/recipe/pdf  - Export existing recipe as PDF");
    info!("  POST /api/recipe-pdf  - Generate recipe and return as PDF");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
