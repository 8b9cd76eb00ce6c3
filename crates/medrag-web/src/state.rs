//! Shared application state for the web server.

use medrag_config::Config;
use medrag_graph::{GraphEnrichment, Neo4jClient};
use medrag_query::{HybridService, OpenAiChat, VectorRetriever};
use medrag_vector::{OpenAiEmbedder, QdrantStore};
use std::sync::Arc;

pub type Service =
    HybridService<VectorRetriever<OpenAiEmbedder>, OpenAiChat, Arc<GraphEnrichment>>;

/// Shared state injected into every handler.
pub struct AppState {
    pub service: Service,
    pub enrichment: Arc<GraphEnrichment>,
    pub store: Arc<QdrantStore>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let embedder = Arc::new(OpenAiEmbedder::new(&config.openai, &config.qdrant));
        let store = Arc::new(QdrantStore::new(&config.qdrant));
        let enrichment = Arc::new(GraphEnrichment::new(Arc::new(Neo4jClient::new(
            &config.neo4j,
        ))));

        let service = HybridService::new(
            VectorRetriever::new(embedder, store.clone()),
            OpenAiChat::new(&config.openai),
            enrichment.clone(),
        );
        Self {
            service,
            enrichment,
            store,
        }
    }
}

pub type SharedState = Arc<AppState>;
