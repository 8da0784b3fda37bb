//! Khet web API
//!
//! Stateless JSON endpoints over the rules core: the client sends the full
//! board with every request and gets the next board back.

mod config;
mod models;
mod routes;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let bind_addr = config.bind_addr.clone();
    info!(
        default_depth = config.default_depth,
        max_depth = config.max_depth,
        tie_break = ?config.tie_break,
        "configuration loaded"
    );

    let app = routes::router(config);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Khet API running on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
