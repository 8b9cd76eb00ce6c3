//! HTTP facade over the hybrid query service.

pub mod handlers;
pub mod router;
pub mod state;
