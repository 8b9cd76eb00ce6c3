//! Drop the Qdrant collection.

use medrag_config::Config;
use medrag_vector::QdrantStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("medrag=debug,info")),
        )
        .init();

    let config = Config::load()?;
    QdrantStore::new(&config.qdrant).delete_collection().await
}
