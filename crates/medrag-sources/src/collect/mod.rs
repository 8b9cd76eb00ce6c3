//! Dataset collectors.
//!
//! [`DataSource`] is the capability interface for literature sources:
//! search for candidate IDs, fetch typed records, resolve citations.
//! The orchestration template (`collect_dataset`) lives on the trait so
//! every source variant shares the same search -> fetch -> citations ->
//! metadata flow.

pub mod gene;
pub mod pubmed;

pub use gene::GeneCollector;
pub use pubmed::PubMedCollector;

use async_trait::async_trait;
use chrono::Utc;
use medrag_common::{CitationNetwork, Paper, PaperDataset, PaperMetadata};
use std::collections::HashMap;
use tracing::{info, warn};

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Search for candidate record IDs matching a query.
    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<String>>;

    /// Fetch and parse full records for a list of IDs.
    async fn fetch_papers(&self, ids: &[String]) -> anyhow::Result<Vec<Paper>>;

    /// Resolve the citation network for one record.
    async fn fetch_citations(&self, id: &str) -> anyhow::Result<CitationNetwork>;

    /// Collect a complete dataset: search, fetch, resolve citations per
    /// paper (the dominant cost; one call pair per paper), then stamp
    /// aggregate metadata. A citation failure for one paper is logged
    /// and skipped, never aborting the run.
    async fn collect_dataset(
        &self,
        query: &str,
        max_results: usize,
    ) -> anyhow::Result<PaperDataset> {
        info!(query, max_results, "searching for papers");
        let ids = self.search(query, max_results).await?;

        info!(n = ids.len(), "fetching paper records");
        let papers = self.fetch_papers(&ids).await?;

        info!(n = papers.len(), "resolving citation networks");
        let mut citation_network = HashMap::new();
        for (i, paper) in papers.iter().enumerate() {
            if paper.pmid.is_empty() {
                continue;
            }
            match self.fetch_citations(&paper.pmid).await {
                Ok(network) => {
                    citation_network.insert(paper.pmid.clone(), network);
                }
                Err(err) => {
                    warn!(pmid = %paper.pmid, error = %err, "citation resolution failed, continuing");
                }
            }
            if (i + 1) % 10 == 0 {
                info!(done = i + 1, total = papers.len(), "citation progress");
            }
        }

        let metadata = PaperMetadata {
            collection_date: Utc::now().to_rfc3339(),
            query: query.to_string(),
            total_papers: papers.len(),
            papers_with_citations: citation_network.len(),
            total_authors: papers.iter().map(|p| p.authors.len()).sum(),
            total_mesh_terms: papers.iter().map(|p| p.mesh_terms.len()).sum(),
        };
        info!(papers = metadata.total_papers, "dataset collection complete");

        Ok(PaperDataset {
            metadata,
            papers,
            citation_network,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medrag_common::{Author, MeshTerm};

    struct StubSource;

    #[async_trait]
    impl DataSource for StubSource {
        async fn search(&self, _query: &str, max_results: usize) -> anyhow::Result<Vec<String>> {
            Ok(vec!["1".into(), "2".into()].into_iter().take(max_results).collect())
        }

        async fn fetch_papers(&self, ids: &[String]) -> anyhow::Result<Vec<Paper>> {
            Ok(ids
                .iter()
                .map(|id| Paper {
                    pmid: id.clone(),
                    title: format!("Paper {id}"),
                    authors: vec![Author::default(), Author::default()],
                    mesh_terms: vec![MeshTerm::default()],
                    ..Default::default()
                })
                .collect())
        }

        async fn fetch_citations(&self, id: &str) -> anyhow::Result<CitationNetwork> {
            if id == "2" {
                anyhow::bail!("elink unavailable");
            }
            Ok(CitationNetwork {
                pmid: id.to_string(),
                cited_by: vec!["9".into()],
                references: vec!["3".into()],
            })
        }
    }

    #[tokio::test]
    async fn template_collects_and_counts() {
        let dataset = StubSource.collect_dataset("cancer", 10).await.unwrap();
        assert_eq!(dataset.papers.len(), 2);
        assert_eq!(dataset.metadata.total_authors, 4);
        assert_eq!(dataset.metadata.total_mesh_terms, 2);
        assert_eq!(dataset.metadata.query, "cancer");
        assert!(!dataset.metadata.collection_date.is_empty());
    }

    #[tokio::test]
    async fn citation_failure_skips_only_that_paper() {
        let dataset = StubSource.collect_dataset("cancer", 10).await.unwrap();
        // Paper "2"'s citation call fails; collection still completes.
        assert_eq!(dataset.metadata.papers_with_citations, 1);
        assert!(dataset.citation_network.contains_key("1"));
        assert!(!dataset.citation_network.contains_key("2"));
    }
}
