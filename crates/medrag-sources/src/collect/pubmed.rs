//! PubMed dataset collector.

use async_trait::async_trait;
use medrag_common::{CitationNetwork, Paper};
use std::sync::Arc;
use tracing::instrument;

use crate::entrez::EntrezClient;
use crate::parse::parse_pubmed_articles;
use crate::retry::{batch_with_fallback, retrying, RetryPolicy};
use crate::DataSource;

const FETCH_CHUNK_SIZE: usize = 100;

pub struct PubMedCollector {
    api: Arc<EntrezClient>,
    policy: RetryPolicy,
}

impl PubMedCollector {
    pub fn new(api: Arc<EntrezClient>) -> Self {
        Self {
            api,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(api: Arc<EntrezClient>, policy: RetryPolicy) -> Self {
        Self { api, policy }
    }

    async fn fetch_and_parse(&self, pmids: Vec<String>) -> anyhow::Result<Vec<Paper>> {
        let xml = self.api.efetch_pubmed(&pmids).await?;
        parse_pubmed_articles(&xml)
    }
}

#[async_trait]
impl DataSource for PubMedCollector {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<String>> {
        retrying(&self.policy, || {
            self.api.esearch("pubmed", query, max_results, "relevance")
        })
        .await
    }

    /// Batched efetch with per-ID fallback: one malformed or failing
    /// PMID cannot sink the rest of its chunk.
    async fn fetch_papers(&self, ids: &[String]) -> anyhow::Result<Vec<Paper>> {
        let papers = batch_with_fallback(
            &self.policy,
            ids,
            FETCH_CHUNK_SIZE,
            |chunk| async move { self.fetch_and_parse(chunk).await },
            |id| async move { self.fetch_and_parse(vec![id]).await },
        )
        .await;
        Ok(papers)
    }

    async fn fetch_citations(&self, id: &str) -> anyhow::Result<CitationNetwork> {
        retrying(&self.policy, || self.api.citations(id)).await
    }
}
