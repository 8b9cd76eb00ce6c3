//! Paper embedding and upsert pipeline.
//!
//! Papers missing a PMID, title or abstract cannot produce a useful
//! point and are skipped before the embedder is ever called. A failed
//! embedding skips that one paper; a failed batch upsert is fatal,
//! since it means the store itself is rejecting writes.

use medrag_common::{GeneDataset, GeneRecord, Paper, PaperDataset};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

use crate::embedding::Embedder;
use crate::store::{Point, QdrantStore};

const EMBED_BATCH_SIZE: usize = 50;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VectorReport {
    pub processed: usize,
    pub skipped: usize,
}

pub struct VectorIngestion<'a, E> {
    embedder: &'a E,
    store: &'a QdrantStore,
    batch_size: usize,
}

impl<'a, E: Embedder> VectorIngestion<'a, E> {
    pub fn new(embedder: &'a E, store: &'a QdrantStore) -> Self {
        Self {
            embedder,
            store,
            batch_size: EMBED_BATCH_SIZE,
        }
    }

    /// Embed and upsert every complete paper in the dataset.
    #[instrument(skip_all, fields(papers = papers.papers.len()))]
    pub async fn ingest(
        &self,
        papers: &PaperDataset,
        genes: Option<&GeneDataset>,
    ) -> anyhow::Result<VectorReport> {
        let gene_index = genes.map(gene_index).unwrap_or_default();
        let mut report = VectorReport::default();

        for batch in papers.papers.chunks(self.batch_size) {
            let (points, skipped) =
                build_points(self.embedder, batch, &papers.citation_network, &gene_index).await;
            report.skipped += skipped;
            report.processed += points.len();
            self.store.upsert_points(&points).await?;
        }

        info!(
            processed = report.processed,
            skipped = report.skipped,
            "vector ingestion complete"
        );
        Ok(report)
    }
}

/// Embed one batch of papers into upsertable points. Incomplete papers
/// and per-paper embedding failures are counted, never propagated.
pub(crate) async fn build_points<E: Embedder>(
    embedder: &E,
    papers: &[Paper],
    citation_network: &HashMap<String, medrag_common::CitationNetwork>,
    gene_index: &HashMap<String, Vec<GeneRecord>>,
) -> (Vec<Point>, usize) {
    let mut points = Vec::with_capacity(papers.len());
    let mut skipped = 0;

    for paper in papers {
        let Some(text) = embedding_input(paper) else {
            skipped += 1;
            continue;
        };
        let vector = match embedder.embed(text).await {
            Ok(v) => v,
            Err(err) => {
                warn!(pmid = %paper.pmid, error = %err, "embedding failed, skipping paper");
                skipped += 1;
                continue;
            }
        };
        points.push(Point {
            id: point_id(&paper.pmid),
            vector,
            payload: paper_payload(paper, citation_network, gene_index),
        });
    }
    (points, skipped)
}

/// The abstract text, or None when the paper is too incomplete to
/// index. The vector is computed from the abstract alone; pmid and
/// title are required for the payload but do not feed the embedding.
pub(crate) fn embedding_input(paper: &Paper) -> Option<&str> {
    if paper.pmid.is_empty() || paper.title.is_empty() || paper.abstract_text.is_empty() {
        return None;
    }
    Some(&paper.abstract_text)
}

/// Stable numeric point ID for a PMID. Numeric PMIDs map directly;
/// anything else hashes to a stable u64 so the ID survives re-runs.
pub(crate) fn point_id(pmid: &str) -> u64 {
    if let Ok(id) = pmid.parse::<u64>() {
        return id;
    }
    let digest = Sha256::digest(pmid.as_bytes());
    u64::from_be_bytes(digest[..8].try_into().unwrap_or_default())
}

pub(crate) fn paper_payload(
    paper: &Paper,
    citation_network: &HashMap<String, medrag_common::CitationNetwork>,
    gene_index: &HashMap<String, Vec<GeneRecord>>,
) -> Value {
    json!({
        "paper": paper,
        "citation_network": citation_network.get(&paper.pmid),
        "genes": gene_index.get(&paper.pmid).cloned().unwrap_or_default(),
    })
}

/// Invert gene linked-PMID lists into a pmid -> genes index.
pub(crate) fn gene_index(dataset: &GeneDataset) -> HashMap<String, Vec<GeneRecord>> {
    let mut index: HashMap<String, Vec<GeneRecord>> = HashMap::new();
    for gene in &dataset.genes {
        for pmid in &gene.linked_pmids {
            index.entry(pmid.clone()).or_default().push(gene.clone());
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    impl CountingEmbedder {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(needle) = self.fail_on {
                if text.contains(needle) {
                    anyhow::bail!("embedding backend unavailable");
                }
            }
            Ok(vec![0.1, 0.2, 0.3])
        }
    }

    fn complete_paper(pmid: &str, title: &str) -> Paper {
        Paper {
            pmid: pmid.into(),
            title: title.into(),
            abstract_text: "An abstract.".into(),
            ..Default::default()
        }
    }

    #[test]
    fn numeric_pmids_map_directly() {
        assert_eq!(point_id("34577062"), 34577062);
    }

    #[test]
    fn embedding_input_is_the_abstract_alone() {
        let paper = complete_paper("1", "A title that must not be embedded");
        assert_eq!(embedding_input(&paper), Some("An abstract."));
    }

    #[test]
    fn non_numeric_pmids_hash_stably() {
        let a = point_id("PMC123");
        let b = point_id("PMC123");
        let c = point_id("PMC124");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, 0);
    }

    #[tokio::test]
    async fn incomplete_papers_never_reach_the_embedder() {
        let embedder = CountingEmbedder::new(None);
        let papers = vec![
            complete_paper("1", "Indexed"),
            Paper {
                pmid: "2".into(),
                title: "No abstract".into(),
                ..Default::default()
            },
            Paper::default(),
        ];
        let (points, skipped) =
            build_points(&embedder, &papers, &HashMap::new(), &HashMap::new()).await;
        assert_eq!(points.len(), 1);
        assert_eq!(skipped, 2);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn embedding_failure_skips_only_that_paper() {
        let embedder = CountingEmbedder::new(Some("Poison"));
        let mut poisoned = complete_paper("2", "Second");
        poisoned.abstract_text = "Poison abstract.".into();
        let papers = vec![
            complete_paper("1", "Fine"),
            poisoned,
            complete_paper("3", "Also fine"),
        ];
        let (points, skipped) =
            build_points(&embedder, &papers, &HashMap::new(), &HashMap::new()).await;
        assert_eq!(points.len(), 2);
        assert_eq!(skipped, 1);
    }

    #[tokio::test]
    async fn payload_carries_citations_and_genes() {
        let embedder = CountingEmbedder::new(None);
        let papers = vec![complete_paper("10", "Linked")];
        let mut citations = HashMap::new();
        citations.insert(
            "10".to_string(),
            medrag_common::CitationNetwork {
                pmid: "10".into(),
                references: vec!["20".into()],
                ..Default::default()
            },
        );
        let genes = GeneDataset {
            genes: vec![GeneRecord {
                gene_id: "7157".into(),
                name: "TP53".into(),
                linked_pmids: vec!["10".into()],
                ..Default::default()
            }],
            ..Default::default()
        };
        let index = gene_index(&genes);

        let (points, _) = build_points(&embedder, &papers, &citations, &index).await;
        let payload = &points[0].payload;
        assert_eq!(payload["paper"]["pmid"], json!("10"));
        assert_eq!(payload["citation_network"]["references"], json!(["20"]));
        assert_eq!(payload["genes"][0]["name"], json!("TP53"));
    }

    #[tokio::test]
    async fn unlinked_paper_gets_null_network_and_empty_genes() {
        let embedder = CountingEmbedder::new(None);
        let papers = vec![complete_paper("99", "Alone")];
        let (points, _) = build_points(&embedder, &papers, &HashMap::new(), &HashMap::new()).await;
        assert!(points[0].payload["citation_network"].is_null());
        assert_eq!(points[0].payload["genes"], json!([]));
    }
}
