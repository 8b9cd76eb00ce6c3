//! Gene dataset collector.
//!
//! Driven by an existing paper dataset rather than a query: PMIDs are
//! resolved to GeneIDs via elink, summaries fetched via esummary, and
//! the pmid->gene link map inverted into per-gene linked-PMID lists.

use medrag_common::{GeneDataset, GeneMetadata, GeneRecord, PaperDataset};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::entrez::{EntrezClient, GeneSummary, LinkSet};
use crate::retry::{batch_with_fallback, RetryPolicy};

const LINK_CHUNK_SIZE: usize = 50;
const SUMMARY_CHUNK_SIZE: usize = 100;

pub struct GeneCollector {
    api: Arc<EntrezClient>,
    policy: RetryPolicy,
}

impl GeneCollector {
    pub fn new(api: Arc<EntrezClient>) -> Self {
        Self {
            api,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(api: Arc<EntrezClient>, policy: RetryPolicy) -> Self {
        Self { api, policy }
    }

    /// Collect gene records for every PMID in a paper dataset.
    #[instrument(skip(self, papers), fields(papers = papers.papers.len()))]
    pub async fn collect_from_papers(&self, papers: &PaperDataset) -> anyhow::Result<GeneDataset> {
        let pmids: Vec<String> = papers
            .papers
            .iter()
            .filter(|p| !p.pmid.is_empty())
            .map(|p| p.pmid.clone())
            .collect();
        if pmids.is_empty() {
            warn!("paper dataset has no PMIDs, returning empty gene dataset");
            return Ok(GeneDataset::default());
        }

        info!(n = pmids.len(), "resolving GeneIDs from PMIDs via elink");
        let linksets = batch_with_fallback(
            &self.policy,
            &pmids,
            LINK_CHUNK_SIZE,
            |chunk| async move { self.api.elink("pubmed", "gene", &chunk, None).await },
            |id| async move { self.api.elink("pubmed", "gene", &[id], None).await },
        )
        .await;
        let pmid_to_genes = linksets_to_map(&linksets, "gene");

        let gene_ids: Vec<String> = pmid_to_genes
            .values()
            .flatten()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect();
        info!(n = gene_ids.len(), "fetching gene summaries");

        let summaries = batch_with_fallback(
            &self.policy,
            &gene_ids,
            SUMMARY_CHUNK_SIZE,
            |chunk| async move { self.api.esummary_gene(&chunk).await },
            |id| async move { self.api.esummary_gene(&[id]).await },
        )
        .await;

        let linked_map = invert_links(&pmid_to_genes);
        let records = build_gene_records(summaries, &linked_map);

        let total_linked = records.iter().map(|r| r.linked_pmids.len()).sum();
        let with_links = records.iter().filter(|r| !r.linked_pmids.is_empty()).count();
        let metadata = GeneMetadata {
            collection_date: chrono::Utc::now().to_rfc3339(),
            total_genes: records.len(),
            genes_with_pubmed_links: with_links,
            total_linked_pmids: total_linked,
        };
        info!(
            genes = metadata.total_genes,
            with_links, total_linked, "gene dataset collection complete"
        );

        Ok(GeneDataset {
            metadata,
            genes: records,
        })
    }
}

/// Fold elink linksets into a `source_id -> sorted unique target IDs`
/// map for one target database.
fn linksets_to_map(linksets: &[LinkSet], db_to: &str) -> HashMap<String, Vec<String>> {
    let mut map: HashMap<String, BTreeSet<String>> = HashMap::new();
    for ls in linksets {
        let Some(source) = ls.source_ids.first() else {
            continue;
        };
        let entry = map.entry(source.clone()).or_default();
        for db in &ls.link_dbs {
            if db.db_to == db_to {
                entry.extend(db.ids.iter().cloned());
            }
        }
    }
    map.into_iter()
        .map(|(k, v)| (k, v.into_iter().collect()))
        .collect()
}

/// Invert pmid -> genes into gene -> pmids, with stable ordering.
fn invert_links(pmid_to_genes: &HashMap<String, Vec<String>>) -> HashMap<String, Vec<String>> {
    let mut inverted: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (pmid, genes) in pmid_to_genes {
        for gene in genes {
            inverted.entry(gene.clone()).or_default().insert(pmid.clone());
        }
    }
    inverted
        .into_iter()
        .map(|(k, v)| (k, v.into_iter().collect()))
        .collect()
}

fn build_gene_records(
    summaries: Vec<GeneSummary>,
    linked_map: &HashMap<String, Vec<String>>,
) -> Vec<GeneRecord> {
    summaries
        .into_iter()
        .map(|s| GeneRecord {
            linked_pmids: linked_map.get(&s.uid).cloned().unwrap_or_default(),
            gene_id: s.uid,
            name: s.name,
            description: s.description,
            chromosome: s.chromosome,
            map_location: s.map_location,
            organism: s.organism,
            aliases: s.aliases,
            designations: s.designations,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entrez::LinkDb;

    fn linkset(source: &str, genes: &[&str]) -> LinkSet {
        LinkSet {
            source_ids: vec![source.to_string()],
            link_dbs: vec![LinkDb {
                db_to: "gene".into(),
                link_name: String::new(),
                ids: genes.iter().map(|g| g.to_string()).collect(),
            }],
        }
    }

    #[test]
    fn linksets_fold_and_dedupe() {
        let sets = vec![
            linkset("100", &["7157", "672"]),
            linkset("100", &["7157"]),
            linkset("200", &["672"]),
            LinkSet::default(), // no source id, ignored
        ];
        let map = linksets_to_map(&sets, "gene");
        assert_eq!(map["100"], vec!["672", "7157"]);
        assert_eq!(map["200"], vec!["672"]);
    }

    #[test]
    fn inversion_produces_per_gene_pmid_lists() {
        let mut pmid_to_genes = HashMap::new();
        pmid_to_genes.insert("100".to_string(), vec!["7157".to_string(), "672".to_string()]);
        pmid_to_genes.insert("200".to_string(), vec!["7157".to_string()]);

        let inverted = invert_links(&pmid_to_genes);
        assert_eq!(inverted["7157"], vec!["100", "200"]);
        assert_eq!(inverted["672"], vec!["100"]);
    }

    #[test]
    fn records_with_no_links_get_empty_lists() {
        let summaries = vec![GeneSummary {
            uid: "999".into(),
            name: "ORPHAN".into(),
            ..Default::default()
        }];
        let records = build_gene_records(summaries, &HashMap::new());
        assert_eq!(records.len(), 1);
        assert!(records[0].linked_pmids.is_empty());
    }
}
