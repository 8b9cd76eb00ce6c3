//! Hybrid question answering over the vector store and the graph.
//!
//! The service runs three phases: vector retrieval, LLM-driven graph
//! enrichment over a fixed tool menu, and a fusion completion that
//! synthesizes the final answer. Each phase sits behind a seam trait
//! so the pipeline is testable without any backend.

pub mod chat;
pub mod prompts;
pub mod retrieve;
pub mod service;
pub mod tools;

pub use chat::{ChatModel, OpenAiChat, ToolInvocation};
pub use retrieve::{DocRetriever, RetrievedDoc, VectorRetriever};
pub use service::{HybridService, QueryOutcome};
pub use tools::Enrichment;
