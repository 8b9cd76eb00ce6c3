//! Typed domain entities for collected literature and gene data.
//!
//! These are the snapshot schema: collectors serialize them to JSON,
//! the graph and vector ingestion services read them back. Every field
//! carries a serde default so a partially populated snapshot reloads
//! cleanly instead of failing on a missing key.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A PubMed paper with parsed metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paper {
    pub pmid: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: Vec<Author>,
    pub mesh_terms: Vec<MeshTerm>,
    /// Loosely normalized YYYY-MM-DD, empty when the record had no year.
    pub publication_date: String,
    pub journal: String,
    pub doi: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub affiliations: Vec<String>,
}

/// Medical Subject Heading assigned to a paper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshTerm {
    pub term: String,
    /// MeSH unique identifier, the merge key in the graph.
    pub ui: String,
    pub major_topic: bool,
    pub qualifiers: Vec<String>,
}

/// NCBI Gene summary enriched with linked PubMed IDs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneRecord {
    pub gene_id: String,
    pub name: String,
    pub description: String,
    pub chromosome: String,
    pub map_location: String,
    pub organism: String,
    pub aliases: String,
    pub designations: String,
    pub linked_pmids: Vec<String>,
}

/// Citation links for one paper, both directions as returned by elink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationNetwork {
    pub pmid: String,
    pub cited_by: Vec<String>,
    pub references: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperMetadata {
    pub collection_date: String,
    pub query: String,
    pub total_papers: usize,
    pub papers_with_citations: usize,
    pub total_authors: usize,
    pub total_mesh_terms: usize,
}

/// Aggregate snapshot produced by paper collection, consumed by ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperDataset {
    pub metadata: PaperMetadata,
    pub papers: Vec<Paper>,
    pub citation_network: HashMap<String, CitationNetwork>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneMetadata {
    pub collection_date: String,
    pub total_genes: usize,
    pub genes_with_pubmed_links: usize,
    pub total_linked_pmids: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneDataset {
    pub metadata: GeneMetadata,
    pub genes: Vec<GeneRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dataset() -> PaperDataset {
        let paper = Paper {
            pmid: "12345678".into(),
            title: "CRISPR screening in pancreatic cancer".into(),
            abstract_text: "We performed a genome-wide screen.".into(),
            authors: vec![Author {
                name: "Jane Doe".into(),
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                affiliations: vec!["MIT".into()],
            }],
            mesh_terms: vec![MeshTerm {
                term: "Neoplasms".into(),
                ui: "D009369".into(),
                major_topic: true,
                qualifiers: vec!["therapy".into()],
            }],
            publication_date: "2023-04-01".into(),
            journal: "Nature".into(),
            doi: "10.1000/test".into(),
        };
        let mut network = HashMap::new();
        network.insert(
            "12345678".to_string(),
            CitationNetwork {
                pmid: "12345678".into(),
                cited_by: vec!["999".into()],
                references: vec!["111".into(), "222".into()],
            },
        );
        PaperDataset {
            metadata: PaperMetadata {
                collection_date: "2025-01-01T00:00:00Z".into(),
                query: "CRISPR cancer".into(),
                total_papers: 1,
                papers_with_citations: 1,
                total_authors: 1,
                total_mesh_terms: 1,
            },
            papers: vec![paper],
            citation_network: network,
        }
    }

    #[test]
    fn paper_dataset_round_trips_through_json() {
        let dataset = sample_dataset();
        let json = serde_json::to_string_pretty(&dataset).unwrap();
        let reloaded: PaperDataset = serde_json::from_str(&json).unwrap();
        assert_eq!(dataset, reloaded);
    }

    #[test]
    fn abstract_field_serializes_under_original_name() {
        let json = serde_json::to_value(sample_dataset().papers[0].clone()).unwrap();
        assert!(json.get("abstract").is_some());
        assert!(json.get("abstract_text").is_none());
    }

    #[test]
    fn missing_fields_default_on_load() {
        let paper: Paper = serde_json::from_str(r#"{"pmid": "42"}"#).unwrap();
        assert_eq!(paper.pmid, "42");
        assert!(paper.title.is_empty());
        assert!(paper.authors.is_empty());
        assert!(!paper.mesh_terms.iter().any(|m| m.major_topic));
    }

    #[test]
    fn gene_dataset_round_trips_through_json() {
        let dataset = GeneDataset {
            metadata: GeneMetadata {
                collection_date: "2025-01-01T00:00:00Z".into(),
                total_genes: 1,
                genes_with_pubmed_links: 1,
                total_linked_pmids: 2,
            },
            genes: vec![GeneRecord {
                gene_id: "7157".into(),
                name: "TP53".into(),
                description: "tumor protein p53".into(),
                chromosome: "17".into(),
                map_location: "17p13.1".into(),
                organism: "Homo sapiens".into(),
                aliases: "P53, LFS1".into(),
                designations: "cellular tumor antigen p53".into(),
                linked_pmids: vec!["12345678".into(), "87654321".into()],
            }],
        };
        let json = serde_json::to_string(&dataset).unwrap();
        let reloaded: GeneDataset = serde_json::from_str(&json).unwrap();
        assert_eq!(dataset, reloaded);
    }
}
