//! The fixed graph-tool menu and its dispatcher.
//!
//! Tool names map to handlers through a static match. The model can
//! only ever reach these four operations, whatever it asks for.

use async_trait::async_trait;
use medrag_graph::GraphEnrichment;
use serde_json::{json, Value};
use tracing::warn;

use crate::chat::ToolInvocation;

pub const TOOL_NAMES: [&str; 4] = [
    "get_collaborators_with_topics",
    "get_collaborating_institutions",
    "get_related_papers_by_mesh",
    "get_genes_in_same_papers",
];

/// Graph enrichment operations available to the query service.
#[async_trait]
pub trait Enrichment: Send + Sync {
    async fn collaborators_with_topics(
        &self,
        author_name: &str,
        topics: &[String],
        require_all: bool,
    ) -> anyhow::Result<Value>;

    async fn collaborating_institutions(&self, min_collaborations: u64) -> anyhow::Result<Value>;

    async fn related_papers_by_mesh(&self, pmid: &str) -> anyhow::Result<Value>;

    async fn genes_in_same_papers(
        &self,
        target_gene: &str,
        mesh_filter: Option<&str>,
    ) -> anyhow::Result<Value>;
}

#[async_trait]
impl<T: Enrichment + ?Sized> Enrichment for std::sync::Arc<T> {
    async fn collaborators_with_topics(
        &self,
        author_name: &str,
        topics: &[String],
        require_all: bool,
    ) -> anyhow::Result<Value> {
        (**self)
            .collaborators_with_topics(author_name, topics, require_all)
            .await
    }

    async fn collaborating_institutions(&self, min_collaborations: u64) -> anyhow::Result<Value> {
        (**self).collaborating_institutions(min_collaborations).await
    }

    async fn related_papers_by_mesh(&self, pmid: &str) -> anyhow::Result<Value> {
        (**self).related_papers_by_mesh(pmid).await
    }

    async fn genes_in_same_papers(
        &self,
        target_gene: &str,
        mesh_filter: Option<&str>,
    ) -> anyhow::Result<Value> {
        (**self).genes_in_same_papers(target_gene, mesh_filter).await
    }
}

#[async_trait]
impl Enrichment for GraphEnrichment {
    async fn collaborators_with_topics(
        &self,
        author_name: &str,
        topics: &[String],
        require_all: bool,
    ) -> anyhow::Result<Value> {
        self.get_collaborators_with_topics(author_name, topics, require_all)
            .await
    }

    async fn collaborating_institutions(&self, min_collaborations: u64) -> anyhow::Result<Value> {
        self.get_collaborating_institutions(min_collaborations).await
    }

    async fn related_papers_by_mesh(&self, pmid: &str) -> anyhow::Result<Value> {
        self.get_related_papers_by_mesh(pmid).await
    }

    async fn genes_in_same_papers(
        &self,
        target_gene: &str,
        mesh_filter: Option<&str>,
    ) -> anyhow::Result<Value> {
        self.get_genes_in_same_papers(target_gene, mesh_filter).await
    }
}

/// OpenAI-style function descriptors for the four operations.
pub fn tool_descriptors() -> Vec<Value> {
    vec![
        json!({
            "type": "function",
            "function": {
                "name": "get_collaborators_with_topics",
                "description": "Find co-authors of a given author on papers tagged with the given MeSH topics.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "author_name": { "type": "string" },
                        "topics": { "type": "array", "items": { "type": "string" } },
                        "require_all": {
                            "type": "boolean",
                            "description": "Require every topic to be covered by the shared papers."
                        }
                    },
                    "required": ["author_name", "topics"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "get_collaborating_institutions",
                "description": "Find pairs of institutions whose authors co-wrote papers together.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "min_collaborations": {
                            "type": "integer",
                            "description": "Minimum number of co-written papers."
                        }
                    }
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "get_related_papers_by_mesh",
                "description": "Find papers sharing MeSH terms with a given paper.",
                "parameters": {
                    "type": "object",
                    "properties": { "pmid": { "type": "string" } },
                    "required": ["pmid"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "get_genes_in_same_papers",
                "description": "Find genes mentioned in the same papers as a target gene, optionally filtered by a MeSH term.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "target_gene": { "type": "string", "description": "Gene symbol, e.g. TP53." },
                        "mesh_filter": { "type": "string" }
                    },
                    "required": ["target_gene"]
                }
            }
        }),
    ]
}

/// Run one requested tool call. An operation that errors yields an
/// error string as its result so the other operations still land.
pub async fn dispatch<E: Enrichment>(enrichment: &E, call: &ToolInvocation) -> Value {
    let args = &call.arguments;
    let result = match call.name.as_str() {
        "get_collaborators_with_topics" => {
            let topics = string_list(&args["topics"]);
            enrichment
                .collaborators_with_topics(
                    args["author_name"].as_str().unwrap_or_default(),
                    &topics,
                    args["require_all"].as_bool().unwrap_or(false),
                )
                .await
        }
        "get_collaborating_institutions" => {
            enrichment
                .collaborating_institutions(args["min_collaborations"].as_u64().unwrap_or(2))
                .await
        }
        "get_related_papers_by_mesh" => {
            enrichment
                .related_papers_by_mesh(args["pmid"].as_str().unwrap_or_default())
                .await
        }
        "get_genes_in_same_papers" => {
            enrichment
                .genes_in_same_papers(
                    args["target_gene"].as_str().unwrap_or_default(),
                    args["mesh_filter"].as_str().filter(|s| !s.is_empty()),
                )
                .await
        }
        other => {
            warn!(tool = other, "model requested an unknown tool");
            return Value::String(format!("Error: unknown tool '{other}'"));
        }
    };
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(tool = %call.name, error = %err, "enrichment operation failed");
            Value::String(format!("Error: {err}"))
        }
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubEnrichment;

    #[async_trait]
    impl Enrichment for StubEnrichment {
        async fn collaborators_with_topics(
            &self,
            author_name: &str,
            topics: &[String],
            require_all: bool,
        ) -> anyhow::Result<Value> {
            Ok(json!({
                "author": author_name,
                "topics": topics,
                "require_all": require_all,
            }))
        }

        async fn collaborating_institutions(
            &self,
            min_collaborations: u64,
        ) -> anyhow::Result<Value> {
            Ok(json!({ "min": min_collaborations }))
        }

        async fn related_papers_by_mesh(&self, _pmid: &str) -> anyhow::Result<Value> {
            anyhow::bail!("graph unavailable")
        }

        async fn genes_in_same_papers(
            &self,
            target_gene: &str,
            mesh_filter: Option<&str>,
        ) -> anyhow::Result<Value> {
            Ok(json!({ "gene": target_gene, "mesh": mesh_filter }))
        }
    }

    #[tokio::test]
    async fn dispatch_routes_by_name_with_parsed_args() {
        let call = ToolInvocation {
            name: "get_collaborators_with_topics".into(),
            arguments: json!({
                "author_name": "Smith J",
                "topics": ["Neoplasms"],
                "require_all": true,
            }),
        };
        let result = dispatch(&StubEnrichment, &call).await;
        assert_eq!(result["author"], json!("Smith J"));
        assert_eq!(result["require_all"], json!(true));
    }

    #[tokio::test]
    async fn missing_min_collaborations_defaults() {
        let call = ToolInvocation {
            name: "get_collaborating_institutions".into(),
            arguments: json!({}),
        };
        let result = dispatch(&StubEnrichment, &call).await;
        assert_eq!(result["min"], json!(2));
    }

    #[tokio::test]
    async fn failing_operation_becomes_error_string() {
        let call = ToolInvocation {
            name: "get_related_papers_by_mesh".into(),
            arguments: json!({ "pmid": "1" }),
        };
        let result = dispatch(&StubEnrichment, &call).await;
        assert_eq!(result, json!("Error: graph unavailable"));
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected_statically() {
        let call = ToolInvocation {
            name: "drop_database".into(),
            arguments: json!({}),
        };
        let result = dispatch(&StubEnrichment, &call).await;
        assert!(result.as_str().unwrap().starts_with("Error: unknown tool"));
    }

    #[test]
    fn descriptors_cover_exactly_the_tool_menu() {
        let descriptors = tool_descriptors();
        assert_eq!(descriptors.len(), TOOL_NAMES.len());
        for (descriptor, name) in descriptors.iter().zip(TOOL_NAMES) {
            assert_eq!(descriptor["function"]["name"], json!(name));
        }
    }
}
