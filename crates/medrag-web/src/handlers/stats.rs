//! Corpus statistics endpoint.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::handlers::ApiError;
use crate::state::SharedState;

/// GET /api/stats
pub async fn stats(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let graph = state.enrichment.graph_stats().await?;
    let points = state.store.point_count().await?;
    Ok(Json(json!({
        "graph": graph,
        "vector": {
            "collection": state.store.collection(),
            "points": points,
        },
    })))
}
