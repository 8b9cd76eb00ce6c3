//! Neo4j client over the HTTP transactional Cypher endpoint.
//!
//! Every call is a single auto-committed transaction:
//! `POST {uri}/db/{database}/tx/commit` with a statements payload.
//! Server-side errors come back in an `errors` array alongside a 200
//! status, so success is judged on that array, not the HTTP code.

use anyhow::Context;
use medrag_common::MedragError;
use medrag_config::Neo4jConfig;
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

pub struct Neo4jClient {
    client: Client,
    uri: String,
    database: String,
    username: String,
    password: String,
}

impl Neo4jClient {
    pub fn new(cfg: &Neo4jConfig) -> Self {
        Self {
            client: Client::new(),
            uri: cfg.uri.trim_end_matches('/').to_string(),
            database: cfg.database.clone(),
            username: cfg.username.clone(),
            password: cfg.password.clone(),
        }
    }

    fn commit_url(&self) -> String {
        format!("{}/db/{}/tx/commit", self.uri, self.database)
    }

    async fn submit(&self, statement: &str, parameters: Value) -> anyhow::Result<Value> {
        let body = json!({
            "statements": [{
                "statement": statement,
                "parameters": parameters,
            }]
        });
        let resp: Value = self
            .client
            .post(self.commit_url())
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("neo4j response was not JSON")?;

        if let Some(errors) = resp["errors"].as_array() {
            if let Some(first) = errors.first() {
                let code = first["code"].as_str().unwrap_or("unknown");
                let message = first["message"].as_str().unwrap_or_default();
                return Err(MedragError::Graph(format!("{code}: {message}")).into());
            }
        }
        Ok(resp)
    }

    /// Run a write statement, discarding any rows.
    #[instrument(skip(self, statement, parameters), fields(cypher = first_line(statement)))]
    pub async fn execute(&self, statement: &str, parameters: Value) -> anyhow::Result<()> {
        self.submit(statement, parameters).await?;
        Ok(())
    }

    /// Run a read statement and return each row as a column->value map.
    #[instrument(skip(self, statement, parameters), fields(cypher = first_line(statement)))]
    pub async fn query(
        &self,
        statement: &str,
        parameters: Value,
    ) -> anyhow::Result<Vec<Map<String, Value>>> {
        let resp = self.submit(statement, parameters).await?;
        let rows = rows_from_response(&resp);
        debug!(n = rows.len(), "query returned rows");
        Ok(rows)
    }

    /// Remove every node and relationship in the database.
    pub async fn delete_graph(&self) -> anyhow::Result<()> {
        self.execute("MATCH (n) DETACH DELETE n", json!({})).await
    }
}

fn first_line(statement: &str) -> &str {
    statement.lines().next().unwrap_or_default().trim()
}

/// Zip the first result's columns against each data row.
pub(crate) fn rows_from_response(resp: &Value) -> Vec<Map<String, Value>> {
    let Some(result) = resp["results"].as_array().and_then(|r| r.first()) else {
        return vec![];
    };
    let columns: Vec<&str> = result["columns"]
        .as_array()
        .map(|cols| cols.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    result["data"]
        .as_array()
        .map(|data| {
            data.iter()
                .filter_map(|entry| entry["row"].as_array())
                .map(|row| {
                    columns
                        .iter()
                        .zip(row.iter())
                        .map(|(col, value)| (col.to_string(), value.clone()))
                        .collect()
                })
                .collect()
        })
        .unwrap_or_default()
}
