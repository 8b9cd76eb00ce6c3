//! Graph construction from dataset snapshots.
//!
//! Node batches go through UNWIND+MERGE statements; the per-paper
//! relationship fan-out (authors, affiliations, MeSH terms, journal)
//! runs as bounded-concurrent tasks. A relationship failure for one
//! paper is logged and counted, never fatal. Citation edges are built
//! from each network's `references` list only, since `cited_by` is the
//! same edge seen from the other side.

use medrag_common::{GeneDataset, GeneRecord, Paper, PaperDataset};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use crate::client::Neo4jClient;

const CONCURRENCY_LIMIT: usize = 25;
const NODE_BATCH_SIZE: usize = 100;
const CITATION_BATCH_SIZE: usize = 500;

const CONSTRAINTS: &[&str] = &[
    "CREATE CONSTRAINT paper_pmid IF NOT EXISTS FOR (p:Paper) REQUIRE p.pmid IS UNIQUE",
    "CREATE CONSTRAINT author_name IF NOT EXISTS FOR (a:Author) REQUIRE a.name IS UNIQUE",
    "CREATE CONSTRAINT institution_name IF NOT EXISTS FOR (i:Institution) REQUIRE i.name IS UNIQUE",
    "CREATE CONSTRAINT mesh_ui IF NOT EXISTS FOR (m:MeshTerm) REQUIRE m.ui IS UNIQUE",
    "CREATE CONSTRAINT qualifier_name IF NOT EXISTS FOR (q:Qualifier) REQUIRE q.name IS UNIQUE",
    "CREATE CONSTRAINT journal_name IF NOT EXISTS FOR (j:Journal) REQUIRE j.name IS UNIQUE",
    "CREATE CONSTRAINT gene_id IF NOT EXISTS FOR (g:Gene) REQUIRE g.gene_id IS UNIQUE",
];

#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestReport {
    pub papers: usize,
    pub skipped_papers: usize,
    pub relationship_failures: usize,
    pub citation_edges: usize,
    pub genes: usize,
}

pub struct GraphIngestion {
    client: Arc<Neo4jClient>,
    concurrency_limit: usize,
    batch_size: usize,
}

impl GraphIngestion {
    pub fn new(client: Arc<Neo4jClient>) -> Self {
        Self {
            client,
            concurrency_limit: CONCURRENCY_LIMIT,
            batch_size: NODE_BATCH_SIZE,
        }
    }

    /// Uniqueness constraints for every node label. Idempotent.
    pub async fn create_constraints(&self) -> anyhow::Result<()> {
        for constraint in CONSTRAINTS {
            self.client.execute(constraint, json!({})).await?;
        }
        info!(n = CONSTRAINTS.len(), "graph constraints ensured");
        Ok(())
    }

    /// Merge paper nodes, their relationship context, and citation
    /// edges from a dataset snapshot.
    #[instrument(skip(self, dataset), fields(papers = dataset.papers.len()))]
    pub async fn ingest_papers(&self, dataset: &PaperDataset) -> anyhow::Result<IngestReport> {
        let (rows, skipped) = paper_rows(&dataset.papers);
        let mut report = IngestReport {
            papers: rows.len(),
            skipped_papers: skipped,
            ..Default::default()
        };
        if skipped > 0 {
            warn!(skipped, "papers without a PMID were skipped");
        }

        for batch in rows.chunks(self.batch_size) {
            self.client
                .execute(
                    "UNWIND $rows AS row \
                     MERGE (p:Paper {pmid: row.pmid}) \
                     SET p.title = row.title, \
                         p.abstract = row.abstract, \
                         p.publication_date = row.publication_date, \
                         p.doi = row.doi",
                    json!({ "rows": batch }),
                )
                .await?;
        }
        info!(papers = report.papers, "paper nodes merged");

        report.relationship_failures = self
            .run_bounded(dataset.papers.iter().filter(|p| !p.pmid.is_empty()).map(
                |paper| {
                    let client = self.client.clone();
                    let paper = paper.clone();
                    async move { merge_paper_context(&client, &paper).await }
                },
            ))
            .await;

        report.citation_edges = self.ingest_citations(dataset).await?;
        Ok(report)
    }

    /// CITES edges in large UNWIND chunks. Edges whose endpoints are
    /// not in the graph drop out through MATCH, by design.
    pub async fn ingest_citations(&self, dataset: &PaperDataset) -> anyhow::Result<usize> {
        let edges = citation_edges(&dataset.citation_network);
        for batch in edges.chunks(CITATION_BATCH_SIZE) {
            self.client
                .execute(
                    "UNWIND $edges AS e \
                     MATCH (a:Paper {pmid: e.from}) \
                     MATCH (b:Paper {pmid: e.to}) \
                     MERGE (a)-[:CITES]->(b)",
                    json!({ "edges": batch }),
                )
                .await?;
        }
        info!(edges = edges.len(), "citation edges merged");
        Ok(edges.len())
    }

    /// Merge gene nodes and their MENTIONED_IN edges.
    #[instrument(skip(self, dataset), fields(genes = dataset.genes.len()))]
    pub async fn ingest_genes(&self, dataset: &GeneDataset) -> anyhow::Result<IngestReport> {
        let rows = gene_rows(&dataset.genes);
        let mut report = IngestReport {
            genes: rows.len(),
            ..Default::default()
        };

        for batch in rows.chunks(self.batch_size) {
            self.client
                .execute(
                    "UNWIND $rows AS row \
                     MERGE (g:Gene {gene_id: row.gene_id}) \
                     SET g.name = row.name, \
                         g.description = row.description, \
                         g.chromosome = row.chromosome, \
                         g.map_location = row.map_location, \
                         g.organism = row.organism, \
                         g.aliases = row.aliases, \
                         g.designations = row.designations",
                    json!({ "rows": batch }),
                )
                .await?;
        }
        info!(genes = report.genes, "gene nodes merged");

        report.relationship_failures = self
            .run_bounded(
                dataset
                    .genes
                    .iter()
                    .filter(|g| !g.linked_pmids.is_empty())
                    .map(|gene| {
                        let client = self.client.clone();
                        let gene_id = gene.gene_id.clone();
                        let pmids = gene.linked_pmids.clone();
                        async move {
                            client
                                .execute(
                                    "MERGE (g:Gene {gene_id: $gene_id}) \
                                     WITH g \
                                     UNWIND $pmids AS pmid \
                                     MERGE (p:Paper {pmid: pmid}) \
                                     MERGE (g)-[:MENTIONED_IN]->(p)",
                                    json!({ "gene_id": gene_id, "pmids": pmids }),
                                )
                                .await
                        }
                    }),
            )
            .await;
        Ok(report)
    }

    /// Drive a set of independent merge tasks with bounded concurrency,
    /// returning the number that failed.
    async fn run_bounded<F>(&self, tasks: impl Iterator<Item = F>) -> usize
    where
        F: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut set = JoinSet::new();
        for task in tasks {
            let semaphore = semaphore.clone();
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                task.await
            });
        }

        let mut failures = 0;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(error = %err, "merge task failed, continuing");
                    failures += 1;
                }
                Err(err) => {
                    warn!(error = %err, "merge task panicked, continuing");
                    failures += 1;
                }
            }
        }
        failures
    }
}

/// Merge one paper's relationship context: journal, authors with
/// affiliations, MeSH terms with qualifiers.
async fn merge_paper_context(client: &Neo4jClient, paper: &Paper) -> anyhow::Result<()> {
    if !paper.journal.is_empty() {
        client
            .execute(
                "MATCH (p:Paper {pmid: $pmid}) \
                 MERGE (j:Journal {name: $journal}) \
                 MERGE (p)-[:PUBLISHED_IN]->(j)",
                json!({ "pmid": paper.pmid, "journal": paper.journal }),
            )
            .await?;
    }

    let authors = author_params(paper);
    if !authors.is_empty() {
        client
            .execute(
                "MATCH (p:Paper {pmid: $pmid}) \
                 UNWIND $authors AS author \
                 MERGE (a:Author {name: author.name}) \
                 MERGE (a)-[:WROTE]->(p) \
                 WITH a, author \
                 UNWIND author.affiliations AS aff \
                 MERGE (i:Institution {name: aff}) \
                 MERGE (a)-[:AFFILIATED_WITH]->(i)",
                json!({ "pmid": paper.pmid, "authors": authors }),
            )
            .await?;
    }

    let mesh = mesh_params(paper);
    if !mesh.is_empty() {
        client
            .execute(
                "MATCH (p:Paper {pmid: $pmid}) \
                 UNWIND $mesh AS m \
                 MERGE (t:MeshTerm {ui: m.ui}) \
                 SET t.term = m.term \
                 MERGE (p)-[r:HAS_MESH_TERM]->(t) \
                 SET r.major_topic = m.major_topic \
                 WITH t, m \
                 UNWIND m.qualifiers AS q \
                 MERGE (qu:Qualifier {name: q}) \
                 MERGE (t)-[:HAS_QUALIFIER]->(qu)",
                json!({ "pmid": paper.pmid, "mesh": mesh }),
            )
            .await?;
    }
    Ok(())
}

// ── row builders ──────────────────────────────────────────────────────

/// Paper node rows; papers without a PMID cannot be keyed and are
/// excluded, with the count returned for reporting.
pub(crate) fn paper_rows(papers: &[Paper]) -> (Vec<Value>, usize) {
    let mut skipped = 0;
    let rows = papers
        .iter()
        .filter(|p| {
            if p.pmid.is_empty() {
                skipped += 1;
                false
            } else {
                true
            }
        })
        .map(|p| {
            json!({
                "pmid": p.pmid,
                "title": p.title,
                "abstract": p.abstract_text,
                "publication_date": p.publication_date,
                "doi": p.doi,
            })
        })
        .collect();
    (rows, skipped)
}

pub(crate) fn gene_rows(genes: &[GeneRecord]) -> Vec<Value> {
    genes
        .iter()
        .filter(|g| !g.gene_id.is_empty())
        .map(|g| {
            json!({
                "gene_id": g.gene_id,
                "name": g.name,
                "description": g.description,
                "chromosome": g.chromosome,
                "map_location": g.map_location,
                "organism": g.organism,
                "aliases": g.aliases,
                "designations": g.designations,
            })
        })
        .collect()
}

pub(crate) fn author_params(paper: &Paper) -> Vec<Value> {
    paper
        .authors
        .iter()
        .filter(|a| !a.name.is_empty())
        .map(|a| json!({ "name": a.name, "affiliations": a.affiliations }))
        .collect()
}

pub(crate) fn mesh_params(paper: &Paper) -> Vec<Value> {
    paper
        .mesh_terms
        .iter()
        .filter(|m| !m.ui.is_empty())
        .map(|m| {
            json!({
                "ui": m.ui,
                "term": m.term,
                "major_topic": m.major_topic,
                "qualifiers": m.qualifiers,
            })
        })
        .collect()
}

/// One directed edge per entry in each network's `references` list.
pub(crate) fn citation_edges(
    networks: &HashMap<String, medrag_common::CitationNetwork>,
) -> Vec<Value> {
    let mut edges: Vec<Value> = networks
        .values()
        .filter(|n| !n.pmid.is_empty())
        .flat_map(|n| {
            n.references
                .iter()
                .filter(|r| !r.is_empty())
                .map(|r| json!({ "from": n.pmid, "to": r }))
        })
        .collect();
    // Stable chunking across runs.
    edges.sort_by_key(|e| {
        (
            e["from"].as_str().unwrap_or_default().to_string(),
            e["to"].as_str().unwrap_or_default().to_string(),
        )
    });
    edges
}
