//! Create the Qdrant collection for paper embeddings.

use medrag_config::Config;
use medrag_vector::QdrantStore;
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
    let store = QdrantStore::new(&config.qdrant);
    if store.collection_exists().await? {
        info!(collection = %store.collection(), "collection already exists");
        return Ok(());
    }
    store.create_collection().await?;
    Ok(())
}
