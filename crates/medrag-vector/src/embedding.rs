//! Text embedding seam and the OpenAI implementation.

use anyhow::Context;
use async_trait::async_trait;
use medrag_config::{OpenAiConfig, QdrantConfig};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::instrument;

const OPENAI_BASE: &str = "https://api.openai.com/v1";

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    dimension: usize,
    base_url: String,
}

impl OpenAiEmbedder {
    pub fn new(openai: &OpenAiConfig, qdrant: &QdrantConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: openai.api_key.clone(),
            model: qdrant.embedding_model.clone(),
            dimension: qdrant.embedding_dimension,
            base_url: OPENAI_BASE.to_string(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let resp: Value = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "input": text,
                "dimensions": self.dimension,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("embeddings response was not JSON")?;

        let vector: Vec<f32> = resp["data"][0]["embedding"]
            .as_array()
            .context("embeddings response had no vector")?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();
        if vector.len() != self.dimension {
            anyhow::bail!(
                "embedding dimension mismatch: got {}, expected {}",
                vector.len(),
                self.dimension
            );
        }
        Ok(vector)
    }
}
