//! Configuration loading for medrag.
//! Reads medrag.toml from the current directory or the path in the
//! MEDRAG_CONFIG env var. API keys and passwords can be left out of the
//! file and supplied via environment variables instead.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub entrez: EntrezConfig,
    pub neo4j: Neo4jConfig,
    pub qdrant: QdrantConfig,
    pub openai: OpenAiConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntrezConfig {
    /// NCBI API key; raises the request ceiling from 3 to 10 rps.
    pub api_key: Option<String>,
    pub email: String,
    pub requests_per_second: u32,
}

impl Default for EntrezConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            email: String::new(),
            requests_per_second: default_entrez_rps(),
        }
    }
}

fn default_entrez_rps() -> u32 { 3 }

impl EntrezConfig {
    /// Effective ceiling: the configured value, bumped to 10 rps when a
    /// key is present and the file still carries the keyless default.
    pub fn effective_rps(&self) -> u32 {
        if self.api_key.is_some() && self.requests_per_second == default_entrez_rps() {
            10
        } else {
            self.requests_per_second.max(1)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Neo4jConfig {
    pub uri: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "http://localhost:7474".to_string(),
            database: "neo4j".to_string(),
            username: "neo4j".to_string(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection_name: String,
    pub embedding_dimension: usize,
    pub embedding_model: String,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            api_key: None,
            collection_name: "biomedical_papers".to_string(),
            embedding_dimension: 1536,
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub pubmed_json_path: String,
    pub gene_json_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            pubmed_json_path: "data/pubmed_dataset.json".to_string(),
            gene_json_path: "data/gene_dataset.json".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from medrag.toml, falling back to defaults when
    /// the file is absent. Secrets in the environment win over the file.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let path = std::env::var("MEDRAG_CONFIG").unwrap_or_else(|_| "medrag.toml".to_string());
        let mut config = if Path::new(&path).exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("NCBI_API_KEY") {
            if !key.is_empty() {
                self.entrez.api_key = Some(key);
            }
        }
        if let Ok(email) = std::env::var("NCBI_EMAIL") {
            if !email.is_empty() {
                self.entrez.email = email;
            }
        }
        if let Ok(password) = std::env::var("NEO4J_PASSWORD") {
            if !password.is_empty() {
                self.neo4j.password = password;
            }
        }
        if let Ok(key) = std::env::var("QDRANT_API_KEY") {
            if !key.is_empty() {
                self.qdrant.api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.openai.api_key = key;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_entrez_rps_without_key() {
        let cfg = EntrezConfig::default();
        assert_eq!(cfg.effective_rps(), 3);
    }

    #[test]
    fn test_api_key_raises_rps_ceiling() {
        let cfg = EntrezConfig {
            api_key: Some("abc".to_string()),
            ..Default::default()
        };
        assert_eq!(cfg.effective_rps(), 10);
    }

    #[test]
    fn test_explicit_rps_is_kept() {
        let cfg = EntrezConfig {
            api_key: Some("abc".to_string()),
            requests_per_second: 5,
            ..Default::default()
        };
        assert_eq!(cfg.effective_rps(), 5);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [neo4j]
            uri = "http://graph:7474"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.neo4j.uri, "http://graph:7474");
        assert_eq!(cfg.neo4j.database, "neo4j");
        assert_eq!(cfg.qdrant.embedding_dimension, 1536);
    }
}
