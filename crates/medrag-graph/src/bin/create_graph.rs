//! Build the knowledge graph from the dataset snapshots on disk.

use medrag_common::{datasets, GeneDataset, PaperDataset};
use medrag_config::Config;
use medrag_graph::{GraphIngestion, Neo4jClient};
use std::sync::Arc;
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
    let client = Arc::new(Neo4jClient::new(&config.neo4j));
    let ingestion = GraphIngestion::new(client);

    ingestion.create_constraints().await?;

    let papers: PaperDataset = datasets::load_dataset(&config.data.pubmed_json_path)?;
    let report = ingestion.ingest_papers(&papers).await?;
    info!(
        papers = report.papers,
        skipped = report.skipped_papers,
        citation_edges = report.citation_edges,
        failures = report.relationship_failures,
        "paper ingestion complete"
    );

    match datasets::load_dataset::<GeneDataset>(&config.data.gene_json_path) {
        Ok(genes) => {
            let report = ingestion.ingest_genes(&genes).await?;
            info!(
                genes = report.genes,
                failures = report.relationship_failures,
                "gene ingestion complete"
            );
        }
        Err(err) => warn!(error = %err, "no gene dataset, skipping gene ingestion"),
    }

    Ok(())
}
