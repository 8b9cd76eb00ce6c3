//! medrag API server entry point.

use medrag_config::Config;
use medrag_web::{router::build_router, state::AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("medrag=debug,info")),
        )
        .init();

    let config = Config::load()?;
    if config.openai.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; query endpoints will fail");
    }

    let state = AppState::new(&config);
    let router = build_router(state);

    let bind_addr =
        std::env::var("MEDRAG_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "medrag API listening");
    axum::serve(listener, router).await?;
    Ok(())
}
