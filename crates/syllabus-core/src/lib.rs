//! syllabus-core
//!
//! Shared domain types, configuration, errors and the embedding provider
//! trait used by the retrieval and relevance crates.

pub mod config;
pub mod corpus;
pub mod error;
pub mod keywords;
pub mod traits;
pub mod types;
pub mod vector;

pub use error::{Error, Result};
pub use types::{ChunkRecord, Passage, RetrievalResult, Source, Unit};
