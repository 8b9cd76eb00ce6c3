//! Collect gene records linked to an existing paper dataset snapshot.

use medrag_common::{datasets, PaperDataset};
use medrag_config::Config;
use medrag_sources::{EntrezClient, GeneCollector, RateLimiter};
use std::sync::Arc;
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
    let papers: PaperDataset = datasets::load_dataset(&config.data.pubmed_json_path)?;
    info!(
        papers = papers.papers.len(),
        path = %config.data.pubmed_json_path,
        "loaded paper dataset"
    );

    let limiter = Arc::new(RateLimiter::new(config.entrez.effective_rps()));
    let api = Arc::new(EntrezClient::new(&config.entrez, limiter));
    let collector = GeneCollector::new(api);

    let dataset = collector.collect_from_papers(&papers).await?;
    datasets::save_dataset(&dataset, &config.data.gene_json_path)?;

    info!(
        genes = dataset.metadata.total_genes,
        with_links = dataset.metadata.genes_with_pubmed_links,
        path = %config.data.gene_json_path,
        "done"
    );
    Ok(())
}
