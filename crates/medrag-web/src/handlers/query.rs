//! Question answering endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::handlers::ApiError;
use crate::state::SharedState;

const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default = "default_query_type")]
    pub query_type: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_query_type() -> String {
    "hybrid".to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<Value>,
    pub query_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_enrichment: Option<Value>,
}

/// POST /api/query
pub async fn query(
    State(state): State<SharedState>,
    Json(request): Json<QueryRequest>,
) -> Result<Response, ApiError> {
    if request.question.trim().is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "question must not be empty" })),
        )
            .into_response());
    }

    let outcome = match request.query_type.as_str() {
        "hybrid" => state.service.answer(&request.question, request.top_k).await?,
        "vector" => {
            state
                .service
                .vector_answer(&request.question, request.top_k)
                .await?
        }
        other => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": format!("unknown query_type '{other}', expected 'hybrid' or 'vector'"),
                })),
            )
                .into_response());
        }
    };

    Ok(Json(QueryResponse {
        answer: outcome.answer,
        sources: outcome.sources,
        query_type: request.query_type,
        graph_enrichment: outcome.graph_enrichment,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_apply() {
        let request: QueryRequest =
            serde_json::from_str(r#"{ "question": "what is TP53?" }"#).unwrap();
        assert_eq!(request.query_type, "hybrid");
        assert_eq!(request.top_k, 5);
    }

    #[test]
    fn vector_enrichment_is_omitted_from_the_response() {
        let response = QueryResponse {
            answer: "a".into(),
            sources: vec![],
            query_type: "vector".into(),
            graph_enrichment: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("graph_enrichment").is_none());
    }
}
