use std::net::SocketAddr;

use axum::Router;
use granite_core::BenchConfig;

/// Serves `app` on an ephemeral localhost port for the lifetime of the test runtime
pub async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub fn config_for(addr: SocketAddr) -> BenchConfig {
    BenchConfig {
        sample_interval_ms: 10,
        ..BenchConfig::default().with_target(addr.ip().to_string(), addr.port())
    }
}

pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}")
}
