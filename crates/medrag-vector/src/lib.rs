//! Vector store ingestion and retrieval over Qdrant.
//!
//! Papers are embedded from their title + abstract and upserted with a
//! payload carrying the full paper record, its citation network, and
//! any genes linked to it.

pub mod embedding;
pub mod ingest;
pub mod store;

pub use embedding::{Embedder, OpenAiEmbedder};
pub use ingest::{VectorIngestion, VectorReport};
pub use store::{QdrantStore, ScoredPoint};
