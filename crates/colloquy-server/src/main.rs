use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use colloquy_bedrock::client::build_client_with_region;
use colloquy_bedrock::converse::BedrockProvider;
use colloquy_server::config::ServerConfig;
use colloquy_server::service::ServiceSettings;
use colloquy_server::state::{AppState, build_store};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Structured JSON logging for CloudWatch
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        region = %config.region,
        model_id = %config.model_id,
        store = ?config.store,
        lambda = config.lambda,
        "starting colloquy"
    );

    let client = build_client_with_region(&config.region).await;
    let provider = Arc::new(BedrockProvider::new(client, &config.model_id));
    let store = build_store(&config.store)?;

    let settings = ServiceSettings {
        request_timeout: config.request_timeout,
        top_k: config.rag_top_k,
        ..ServiceSettings::default()
    };
    let app = colloquy_server::app(AppState::new(provider, store, settings));

    if config.lambda {
        return lambda_http::run(app).await.map_err(|e| eyre::eyre!(e));
    }

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
