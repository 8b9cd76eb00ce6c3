//! Graph enrichment queries used during hybrid question answering.
//!
//! A fixed menu of four parameterized read operations. Each returns
//! its rows as a JSON array so results can be embedded directly into
//! a fusion prompt. Name lookups (author, gene, MeSH topic) are
//! case-insensitive substring matches: the caller is an LLM and will
//! hand over fragments like "Smith" or "ccr5", not exact node keys.

use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::instrument;

use crate::client::Neo4jClient;

const RESULT_LIMIT: usize = 20;

/// Graph shape summary shown to the tool-selection model.
pub const GRAPH_SCHEMA: &str = "\
Nodes: Paper(pmid, title, abstract, publication_date, doi), \
Author(name), Institution(name), MeshTerm(ui, term), Qualifier(name), \
Journal(name), Gene(gene_id, name, description, chromosome, organism, \
aliases, designations). \
Relationships: (Author)-[:WROTE]->(Paper), \
(Author)-[:AFFILIATED_WITH]->(Institution), \
(Paper)-[:HAS_MESH_TERM {major_topic}]->(MeshTerm), \
(MeshTerm)-[:HAS_QUALIFIER]->(Qualifier), \
(Paper)-[:PUBLISHED_IN]->(Journal), \
(Paper)-[:CITES]->(Paper), \
(Gene)-[:MENTIONED_IN]->(Paper).";

const COLLABORATORS_CYPHER: &str = "\
MATCH (a:Author)-[:WROTE]->(p:Paper)<-[:WROTE]-(c:Author) \
WHERE toLower(a.name) CONTAINS toLower($author) AND a <> c \
MATCH (p)-[:HAS_MESH_TERM]->(m:MeshTerm) \
WHERE ANY(t IN $topics WHERE toLower(m.term) CONTAINS toLower(t)) \
WITH c.name AS collaborator, \
     collect(DISTINCT m.term) AS matched_topics, \
     count(DISTINCT p) AS shared_papers \
WHERE NOT $require_all \
   OR ALL(t IN $topics \
          WHERE ANY(term IN matched_topics \
                    WHERE toLower(term) CONTAINS toLower(t))) \
RETURN collaborator, matched_topics, shared_papers \
ORDER BY shared_papers DESC LIMIT $limit";

const INSTITUTIONS_CYPHER: &str = "\
MATCH (i1:Institution)<-[:AFFILIATED_WITH]-(a1:Author)-[:WROTE]->(p:Paper)\
<-[:WROTE]-(a2:Author)-[:AFFILIATED_WITH]->(i2:Institution) \
WHERE i1.name < i2.name \
WITH i1.name AS institution_a, i2.name AS institution_b, \
     count(DISTINCT p) AS collaborations \
WHERE collaborations >= $min_collaborations \
RETURN institution_a, institution_b, collaborations \
ORDER BY collaborations DESC LIMIT $limit";

const RELATED_PAPERS_CYPHER: &str = "\
MATCH (p:Paper {pmid: $pmid})-[:HAS_MESH_TERM]->(m:MeshTerm)\
<-[:HAS_MESH_TERM]-(other:Paper) \
WHERE other.pmid <> $pmid \
WITH other, collect(DISTINCT m.term) AS shared_terms \
RETURN other.pmid AS pmid, other.title AS title, \
       shared_terms, size(shared_terms) AS shared_count \
ORDER BY shared_count DESC LIMIT $limit";

// Gene lookup matches the symbol against the name or the alias list,
// so "p53" finds TP53 and "CCR5" finds genes where it is an alias.
const GENES_CYPHER: &str = "\
MATCH (g:Gene)-[:MENTIONED_IN]->(p:Paper)<-[:MENTIONED_IN]-(other:Gene) \
WHERE (toLower(g.name) CONTAINS toLower($gene) \
       OR toLower(g.aliases) CONTAINS toLower($gene)) \
  AND g <> other \
WITH other, count(DISTINCT p) AS shared_papers \
RETURN other.gene_id AS gene_id, other.name AS name, shared_papers \
ORDER BY shared_papers DESC LIMIT $limit";

const GENES_WITH_MESH_CYPHER: &str = "\
MATCH (g:Gene)-[:MENTIONED_IN]->(p:Paper)<-[:MENTIONED_IN]-(other:Gene) \
WHERE (toLower(g.name) CONTAINS toLower($gene) \
       OR toLower(g.aliases) CONTAINS toLower($gene)) \
  AND g <> other \
MATCH (p)-[:HAS_MESH_TERM]->(m:MeshTerm) \
WHERE toLower(m.term) CONTAINS toLower($mesh) \
WITH other, count(DISTINCT p) AS shared_papers \
RETURN other.gene_id AS gene_id, other.name AS name, shared_papers \
ORDER BY shared_papers DESC LIMIT $limit";

pub struct GraphEnrichment {
    client: Arc<Neo4jClient>,
}

impl GraphEnrichment {
    pub fn new(client: Arc<Neo4jClient>) -> Self {
        Self { client }
    }

    /// Co-authors of `author_name` on papers tagged with the given
    /// MeSH topics. With `require_all`, a collaborator must cover
    /// every requested topic across the shared papers.
    #[instrument(skip(self))]
    pub async fn get_collaborators_with_topics(
        &self,
        author_name: &str,
        topics: &[String],
        require_all: bool,
    ) -> anyhow::Result<Value> {
        let rows = self
            .client
            .query(
                COLLABORATORS_CYPHER,
                json!({
                    "author": author_name,
                    "topics": topics,
                    "require_all": require_all,
                    "limit": RESULT_LIMIT,
                }),
            )
            .await?;
        Ok(rows_to_value(rows))
    }

    /// Institution pairs whose authors co-wrote at least
    /// `min_collaborations` papers.
    #[instrument(skip(self))]
    pub async fn get_collaborating_institutions(
        &self,
        min_collaborations: u64,
    ) -> anyhow::Result<Value> {
        let rows = self
            .client
            .query(
                INSTITUTIONS_CYPHER,
                json!({ "min_collaborations": min_collaborations, "limit": RESULT_LIMIT }),
            )
            .await?;
        Ok(rows_to_value(rows))
    }

    /// Papers sharing MeSH terms with the given paper, ranked by how
    /// many terms they share.
    #[instrument(skip(self))]
    pub async fn get_related_papers_by_mesh(&self, pmid: &str) -> anyhow::Result<Value> {
        let rows = self
            .client
            .query(
                RELATED_PAPERS_CYPHER,
                json!({ "pmid": pmid, "limit": RESULT_LIMIT }),
            )
            .await?;
        Ok(rows_to_value(rows))
    }

    /// Genes mentioned in the same papers as the target gene,
    /// optionally restricted to papers matching a MeSH term substring.
    #[instrument(skip(self))]
    pub async fn get_genes_in_same_papers(
        &self,
        target_gene: &str,
        mesh_filter: Option<&str>,
    ) -> anyhow::Result<Value> {
        let statement = match mesh_filter {
            Some(_) => GENES_WITH_MESH_CYPHER,
            None => GENES_CYPHER,
        };
        let rows = self
            .client
            .query(
                statement,
                json!({
                    "gene": target_gene,
                    "mesh": mesh_filter.unwrap_or_default(),
                    "limit": RESULT_LIMIT,
                }),
            )
            .await?;
        Ok(rows_to_value(rows))
    }

    /// Node and relationship counts by label/type, for the stats
    /// endpoint.
    pub async fn graph_stats(&self) -> anyhow::Result<Value> {
        let nodes = self
            .client
            .query(
                "MATCH (n) UNWIND labels(n) AS label \
                 RETURN label, count(*) AS count ORDER BY label",
                json!({}),
            )
            .await?;
        let relationships = self
            .client
            .query(
                "MATCH ()-[r]->() \
                 RETURN type(r) AS type, count(*) AS count ORDER BY type",
                json!({}),
            )
            .await?;
        Ok(json!({
            "nodes": rows_to_value(nodes),
            "relationships": rows_to_value(relationships),
        }))
    }
}

fn rows_to_value(rows: Vec<Map<String, Value>>) -> Value {
    Value::Array(rows.into_iter().map(Value::Object).collect())
}
