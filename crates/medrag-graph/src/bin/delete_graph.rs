//! Remove every node and relationship from the graph database.

use medrag_config::Config;
use medrag_graph::Neo4jClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("medrag=debug,info")),
        )
        .init();

    let config = Config::load()?;
    let client = Neo4jClient::new(&config.neo4j);
    client.delete_graph().await?;
    info!(database = %config.neo4j.database, "graph cleared");
    Ok(())
}
