use std::sync::Arc;

use anyhow::{bail, Result};
use embed_server::{load_model, router, AppState};
use granite_core::EmbedServerConfig;
use tokio::sync::oneshot;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .compact()
        .init();

    let config = EmbedServerConfig::from_env()?;
    let addr = config.addr();
    let state = Arc::new(AppState::new(config));

    // Load in the background so /health answers "loading" meanwhile.
    let (failed_tx, failed_rx) = oneshot::channel::<String>();
    let loader = state.clone();
    tokio::spawn(async move {
        info!(
            "Loading {} (this may take a few minutes)...",
            loader.config.model_id
        );
        let worker = loader.clone();
        let loaded = tokio::task::spawn_blocking(move || {
            load_model(&worker.config).map_err(|e| e.to_string())
        })
        .await;
        let reason = match loaded {
            Ok(Ok(embedder)) => {
                loader.install(embedder);
                info!("Model ready");
                return;
            }
            Ok(Err(e)) => e,
            Err(e) => e.to_string(),
        };
        error!("Failed to load model: {}", reason);
        let _ = failed_tx.send(reason);
    });

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let app = router(state);

    tokio::select! {
        served = async { axum::serve(listener, app).await } => served?,
        Ok(reason) = failed_rx => bail!("model loading failed: {reason}"),
    }

    Ok(())
}
