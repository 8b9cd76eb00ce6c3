//! The hybrid query pipeline.

use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::chat::ChatModel;
use crate::prompts::{fusion_prompt, hybrid_prompt, render_context, source_summaries, vector_prompt};
use crate::retrieve::DocRetriever;
use crate::tools::{dispatch, tool_descriptors, Enrichment, TOOL_NAMES};

#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub answer: String,
    pub sources: Vec<Value>,
    /// Enrichment results keyed by operation name; None for the
    /// retrieval-only path.
    pub graph_enrichment: Option<Value>,
}

pub struct HybridService<R, C, E> {
    retriever: R,
    chat: C,
    enrichment: E,
}

impl<R: DocRetriever, C: ChatModel, E: Enrichment> HybridService<R, C, E> {
    pub fn new(retriever: R, chat: C, enrichment: E) -> Self {
        Self {
            retriever,
            chat,
            enrichment,
        }
    }

    /// Full pipeline: retrieve, let the model pick graph tools, run
    /// them, then fuse everything into one answer.
    #[instrument(skip(self, question))]
    pub async fn answer(&self, question: &str, top_k: usize) -> anyhow::Result<QueryOutcome> {
        let docs = self.retriever.retrieve(question, top_k).await?;
        info!(retrieved = docs.len(), "vector retrieval complete");
        let context = render_context(&docs);
        let sources = source_summaries(&docs);

        let calls = self
            .chat
            .request_tool_calls(&hybrid_prompt(question, &context), &tool_descriptors())
            .await?;
        let mut results = Map::new();
        for call in &calls {
            if !TOOL_NAMES.contains(&call.name.as_str()) {
                warn!(tool = %call.name, "ignoring tool call outside the menu");
                continue;
            }
            let value = dispatch(&self.enrichment, call).await;
            results.insert(call.name.clone(), value);
        }
        info!(operations = results.len(), "graph enrichment complete");
        let enrichment = Value::Object(results);

        let answer = self
            .chat
            .complete(&fusion_prompt(question, &context, &enrichment))
            .await?;
        Ok(QueryOutcome {
            answer,
            sources,
            graph_enrichment: Some(enrichment),
        })
    }

    /// Retrieval-only path, no graph phase.
    #[instrument(skip(self, question))]
    pub async fn vector_answer(&self, question: &str, top_k: usize) -> anyhow::Result<QueryOutcome> {
        let docs = self.retriever.retrieve(question, top_k).await?;
        let context = render_context(&docs);
        let sources = source_summaries(&docs);
        let answer = self.chat.complete(&vector_prompt(question, &context)).await?;
        Ok(QueryOutcome {
            answer,
            sources,
            graph_enrichment: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ToolInvocation;
    use crate::retrieve::RetrievedDoc;
    use async_trait::async_trait;
    use serde_json::json;

    struct StubRetriever;

    #[async_trait]
    impl DocRetriever for StubRetriever {
        async fn retrieve(
            &self,
            _question: &str,
            top_k: usize,
        ) -> anyhow::Result<Vec<RetrievedDoc>> {
            Ok((0..top_k.min(2))
                .map(|i| RetrievedDoc {
                    pmid: format!("{}", 100 + i),
                    title: format!("Paper {i}"),
                    score: 0.9 - i as f32 * 0.1,
                    payload: json!({
                        "paper": {
                            "pmid": format!("{}", 100 + i),
                            "title": format!("Paper {i}"),
                            "abstract": "Findings.",
                            "authors": [{"name": "A One"}],
                        }
                    }),
                })
                .collect())
        }
    }

    struct StubChat;

    #[async_trait]
    impl ChatModel for StubChat {
        async fn request_tool_calls(
            &self,
            _prompt: &str,
            _tools: &[serde_json::Value],
        ) -> anyhow::Result<Vec<ToolInvocation>> {
            Ok(vec![
                ToolInvocation {
                    name: "get_related_papers_by_mesh".into(),
                    arguments: json!({ "pmid": "100" }),
                },
                ToolInvocation {
                    name: "invent_a_tool".into(),
                    arguments: json!({}),
                },
            ])
        }

        async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
            Ok(format!("Answer based on {} chars of prompt.", prompt.len()))
        }
    }

    struct StubEnrichment;

    #[async_trait]
    impl Enrichment for StubEnrichment {
        async fn collaborators_with_topics(
            &self,
            _author_name: &str,
            _topics: &[String],
            _require_all: bool,
        ) -> anyhow::Result<Value> {
            Ok(json!([]))
        }

        async fn collaborating_institutions(&self, _min: u64) -> anyhow::Result<Value> {
            Ok(json!([]))
        }

        async fn related_papers_by_mesh(&self, pmid: &str) -> anyhow::Result<Value> {
            Ok(json!([{ "pmid": "200", "shared_with": pmid }]))
        }

        async fn genes_in_same_papers(
            &self,
            _target_gene: &str,
            _mesh_filter: Option<&str>,
        ) -> anyhow::Result<Value> {
            Ok(json!([]))
        }
    }

    #[tokio::test]
    async fn hybrid_answer_runs_all_three_phases() {
        let service = HybridService::new(StubRetriever, StubChat, StubEnrichment);
        let outcome = service.answer("what is known about TP53?", 5).await.unwrap();

        assert!(!outcome.answer.is_empty());
        assert_eq!(outcome.sources.len(), 2);

        let enrichment = outcome.graph_enrichment.unwrap();
        let keys: Vec<&String> = enrichment.as_object().unwrap().keys().collect();
        assert!(keys.iter().all(|k| TOOL_NAMES.contains(&k.as_str())));
        assert_eq!(
            enrichment["get_related_papers_by_mesh"][0]["shared_with"],
            json!("100")
        );
    }

    #[tokio::test]
    async fn vector_answer_skips_the_graph_phase() {
        let service = HybridService::new(StubRetriever, StubChat, StubEnrichment);
        let outcome = service.vector_answer("question", 1).await.unwrap();
        assert!(!outcome.answer.is_empty());
        assert_eq!(outcome.sources.len(), 1);
        assert!(outcome.graph_enrichment.is_none());
    }
}
