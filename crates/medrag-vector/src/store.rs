//! Qdrant vector store client over its REST API.

use anyhow::Context;
use medrag_common::MedragError;
use medrag_config::QdrantConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

pub struct QdrantStore {
    client: Client,
    url: String,
    api_key: Option<String>,
    collection: String,
    dimension: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoredPoint {
    pub id: Value,
    pub score: f32,
    #[serde(default)]
    pub payload: Value,
}

impl QdrantStore {
    pub fn new(cfg: &QdrantConfig) -> Self {
        Self {
            client: Client::new(),
            url: cfg.url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            collection: cfg.collection_name.clone(),
            dimension: cfg.embedding_dimension,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, format!("{}{}", self.url, path));
        if let Some(key) = &self.api_key {
            req = req.header("api-key", key);
        }
        req
    }

    async fn check(resp: reqwest::Response) -> anyhow::Result<Value> {
        let status = resp.status();
        let body: Value = resp.json().await.context("qdrant response was not JSON")?;
        if !status.is_success() {
            let detail = body["status"]["error"].as_str().unwrap_or_default();
            return Err(MedragError::Vector(format!("{status}: {detail}")).into());
        }
        Ok(body)
    }

    /// Create the collection with a dense Cosine vector of the
    /// configured dimension. Fails if it already exists.
    #[instrument(skip(self))]
    pub async fn create_collection(&self) -> anyhow::Result<()> {
        let body = json!({
            "vectors": { "size": self.dimension, "distance": "Cosine" }
        });
        let resp = self
            .request(reqwest::Method::PUT, &format!("/collections/{}", self.collection))
            .json(&body)
            .send()
            .await?;
        Self::check(resp).await?;
        info!(collection = %self.collection, dim = self.dimension, "collection created");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_collection(&self) -> anyhow::Result<()> {
        let resp = self
            .request(
                reqwest::Method::DELETE,
                &format!("/collections/{}", self.collection),
            )
            .send()
            .await?;
        Self::check(resp).await?;
        info!(collection = %self.collection, "collection deleted");
        Ok(())
    }

    pub async fn collection_exists(&self) -> anyhow::Result<bool> {
        let resp = self
            .request(
                reqwest::Method::GET,
                &format!("/collections/{}/exists", self.collection),
            )
            .send()
            .await?;
        let body = Self::check(resp).await?;
        Ok(body["result"]["exists"].as_bool().unwrap_or(false))
    }

    /// Upsert a batch of points in one call, waiting for persistence.
    #[instrument(skip(self, points), fields(n = points.len()))]
    pub async fn upsert_points(&self, points: &[Point]) -> anyhow::Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let resp = self
            .request(
                reqwest::Method::PUT,
                &format!("/collections/{}/points?wait=true", self.collection),
            )
            .json(&json!({ "points": points }))
            .send()
            .await?;
        Self::check(resp).await?;
        debug!(n = points.len(), "points upserted");
        Ok(())
    }

    /// Nearest-neighbour search returning payloads.
    #[instrument(skip(self, vector))]
    pub async fn query_points(&self, vector: &[f32], limit: usize) -> anyhow::Result<Vec<ScoredPoint>> {
        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/search", self.collection),
            )
            .json(&json!({
                "vector": vector,
                "limit": limit,
                "with_payload": true,
            }))
            .send()
            .await?;
        let body = Self::check(resp).await?;
        let hits = serde_json::from_value(body["result"].clone())
            .context("qdrant search result had unexpected shape")?;
        Ok(hits)
    }

    /// Point count for the stats endpoint.
    pub async fn point_count(&self) -> anyhow::Result<u64> {
        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/count", self.collection),
            )
            .json(&json!({ "exact": true }))
            .send()
            .await?;
        let body = Self::check(resp).await?;
        Ok(body["result"]["count"].as_u64().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scored_points_deserialize_from_search_result() {
        let result = json!([
            { "id": 12345, "score": 0.91, "payload": { "paper": { "pmid": "12345" } } },
            { "id": 6789, "score": 0.73 }
        ]);
        let hits: Vec<ScoredPoint> = serde_json::from_value(result).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].score, 0.91);
        assert_eq!(hits[0].payload["paper"]["pmid"], json!("12345"));
        assert!(hits[1].payload.is_null());
    }
}
