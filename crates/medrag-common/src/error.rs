use thiserror::Error;

#[derive(Debug, Error)]
pub enum MedragError {
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("graph database error: {0}")]
    Graph(String),

    #[error("vector store error: {0}")]
    Vector(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MedragError>;
