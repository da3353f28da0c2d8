use std::sync::Arc;

use anyhow::Result;
use granite_core::{BenchConfig, TriggerServerConfig};
use granite_server::{router, AppState};
use tracing::info;

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

    let server = TriggerServerConfig::from_env()?;
    let bench = BenchConfig::from_env()?;
    let addr = server.addr();

    info!(
        default_target = %format!("{}:{}", server.default_target_host, server.default_target_port),
        "Benchmark API configured"
    );

    let app = router(Arc::new(AppState::new(server, bench)));

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
