//! Neo4j knowledge-graph construction and enrichment queries.
//!
//! The graph is built from the JSON dataset snapshots written by
//! `medrag-sources`. All writes are MERGE-based, so re-running an
//! ingestion against the same dataset is a no-op.

pub mod client;
pub mod enrich;
pub mod ingest;

pub use client::Neo4jClient;
pub use enrich::GraphEnrichment;
pub use ingest::{GraphIngestion, IngestReport};
