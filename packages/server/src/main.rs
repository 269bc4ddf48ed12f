use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use depot_server::config::AppConfig;
use depot_server::state::AppState;
use depot_server::utils::id_token::IdTokenVerifier;
use nexus::NexusBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let store = common::storage::connect(&config.storage)
        .await
        .context("Failed to initialise blob store")?;
    let verifier =
        IdTokenVerifier::from_config(&config.auth).context("Invalid ID token verification key")?;
    tokio::fs::create_dir_all(&config.ingest.staging_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create staging directory {}",
                config.ingest.staging_dir.display()
            )
        })?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(
        backend = ?config.storage.backend,
        bucket = %config.storage.bucket,
        schema_dir = %config.ingest.schema_dir.display(),
        "Configuration loaded"
    );

    let state = AppState::new(config, store, Arc::new(NexusBuilder::default()), verifier);
    let app = depot_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
