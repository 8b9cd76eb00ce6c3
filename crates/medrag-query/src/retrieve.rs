//! Vector retrieval seam.

use async_trait::async_trait;
use medrag_vector::{Embedder, QdrantStore};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// One retrieved document: the paper payload plus its similarity score.
#[derive(Debug, Clone)]
pub struct RetrievedDoc {
    pub pmid: String,
    pub title: String,
    pub score: f32,
    pub payload: Value,
}

#[async_trait]
pub trait DocRetriever: Send + Sync {
    async fn retrieve(&self, question: &str, top_k: usize) -> anyhow::Result<Vec<RetrievedDoc>>;
}

pub struct VectorRetriever<E> {
    embedder: Arc<E>,
    store: Arc<QdrantStore>,
}

impl<E: Embedder> VectorRetriever<E> {
    pub fn new(embedder: Arc<E>, store: Arc<QdrantStore>) -> Self {
        Self { embedder, store }
    }
}

#[async_trait]
impl<E: Embedder> DocRetriever for VectorRetriever<E> {
    #[instrument(skip(self, question))]
    async fn retrieve(&self, question: &str, top_k: usize) -> anyhow::Result<Vec<RetrievedDoc>> {
        let vector = self.embedder.embed(question).await?;
        let hits = self.store.query_points(&vector, top_k).await?;
        Ok(hits
            .into_iter()
            .map(|hit| RetrievedDoc {
                pmid: hit.payload["paper"]["pmid"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                title: hit.payload["paper"]["title"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                score: hit.score,
                payload: hit.payload,
            })
            .collect())
    }
}
