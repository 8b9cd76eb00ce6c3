//! Data source clients and dataset collectors.
//!
//! Everything outbound goes through a shared [`rate_limit::RateLimiter`]
//! and, for batched ID operations, the [`retry`] executor. Collectors
//! assemble typed datasets and persist them as JSON snapshots, which are
//! the only interchange with the ingestion crates.

pub mod collect;
pub mod entrez;
pub mod parse;
pub mod rate_limit;
pub mod retry;

pub use collect::{DataSource, GeneCollector, PubMedCollector};
pub use entrez::EntrezClient;
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
