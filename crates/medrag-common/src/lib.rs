//! Shared domain entities and error type for the medrag workspace.

pub mod datasets;
pub mod entities;
pub mod error;

pub use entities::{
    Author, CitationNetwork, GeneDataset, GeneMetadata, GeneRecord, MeshTerm, Paper, PaperDataset,
    PaperMetadata,
};
pub use error::{MedragError, Result};
