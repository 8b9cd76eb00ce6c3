//! Embed the paper dataset and upsert it into Qdrant.

use medrag_common::{datasets, GeneDataset, PaperDataset};
use medrag_config::Config;
use medrag_vector::{OpenAiEmbedder, QdrantStore, VectorIngestion};
use tracing::{info, warn};
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
        anyhow::bail!("OPENAI_API_KEY is required for embedding");
    }

    let papers: PaperDataset = datasets::load_dataset(&config.data.pubmed_json_path)?;
    let genes = match datasets::load_dataset::<GeneDataset>(&config.data.gene_json_path) {
        Ok(g) => Some(g),
        Err(err) => {
            warn!(error = %err, "no gene dataset, payloads will carry no genes");
            None
        }
    };

    let embedder = OpenAiEmbedder::new(&config.openai, &config.qdrant);
    let store = QdrantStore::new(&config.qdrant);
    if !store.collection_exists().await? {
        store.create_collection().await?;
    }

    let report = VectorIngestion::new(&embedder, &store)
        .ingest(&papers, genes.as_ref())
        .await?;
    info!(
        processed = report.processed,
        skipped = report.skipped,
        collection = %store.collection(),
        "done"
    );
    Ok(())
}
