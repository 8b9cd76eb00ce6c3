//! Collect a PubMed paper dataset and write it to disk as JSON.
//!
//! Usage: collect_papers [QUERY] [MAX_RESULTS]

use medrag_common::{datasets, PaperDataset};
use medrag_config::Config;
use medrag_sources::{DataSource, EntrezClient, PubMedCollector, RateLimiter};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_QUERY: &str = "cancer genomics";
const DEFAULT_MAX_RESULTS: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("medrag=debug,info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let query = args.next().unwrap_or_else(|| DEFAULT_QUERY.to_string());
    let max_results: usize = args
        .next()
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or(DEFAULT_MAX_RESULTS);

    let config = Config::load()?;
    let limiter = Arc::new(RateLimiter::new(config.entrez.effective_rps()));
    let api = Arc::new(EntrezClient::new(&config.entrez, limiter));
    let collector = PubMedCollector::new(api);

    info!(query, max_results, "collecting PubMed dataset");
    let dataset: PaperDataset = collector.collect_dataset(&query, max_results).await?;
    datasets::save_dataset(&dataset, &config.data.pubmed_json_path)?;

    info!(
        papers = dataset.metadata.total_papers,
        with_citations = dataset.metadata.papers_with_citations,
        path = %config.data.pubmed_json_path,
        "done"
    );
    Ok(())
}
