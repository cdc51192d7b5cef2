//! Trestle Storage Layer
//!
//! Implements the `GraphStore` trait against Neo4j over Bolt, plus an
//! in-memory store with the same merge semantics for tests.
//!
//! # Merge semantics
//!
//! - Entities upsert by `(name, entity_type)`, exact match
//! - Relationships upsert by `(source, type, target)` after endpoint
//!   resolution through the temp-id map
//! - Episodes are always created, never merged
//!
//! All labels and relationship types pass through the sanitizers in
//! `trestle-domain` before they are interpolated into Cypher; only
//! values travel as query parameters.
//!
//! # Examples
//!
//! ```no_run
//! use trestle_store::{Neo4jStore, StoreConfig};
//!
//! # async fn example() -> Result<(), trestle_store::StoreError> {
//! let store = Neo4jStore::connect(StoreConfig::from_env()?).await?;
//! store.ensure_schema().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod memory;
mod neo4j;

pub use memory::MemoryStore;
pub use neo4j::Neo4jStore;

use thiserror::Error;

/// Default Bolt endpoint when `NEO4J_URI` is unset.
pub const DEFAULT_URI: &str = "bolt://localhost:7687";

/// Default username when `NEO4J_USER` is unset.
pub const DEFAULT_USER: &str = "neo4j";

/// Relationship property keys managed by the store itself; stripped
/// from caller-supplied property bags before merging.
pub(crate) const RESERVED_RELATIONSHIP_PROPS: &[&str] = &["episodes", "expired_at", "invalid_at"];

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Bolt or server-side error
    #[error("Neo4j error: {0}")]
    Database(#[from] neo4rs::Error),

    /// A result row did not decode into the expected shape
    #[error("Row decode error: {0}")]
    Decode(#[from] neo4rs::DeError),

    /// Missing or invalid connection configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A query returned no row where one was required
    #[error("Missing result: {0}")]
    MissingResult(String),

    /// Stored data did not have the expected shape
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// Connection settings for the Neo4j store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Bolt endpoint URI
    pub uri: String,
    /// Username
    pub user: String,
    /// Password
    pub password: String,
}

impl StoreConfig {
    /// Read connection settings from the environment.
    ///
    /// `NEO4J_PASSWORD` is required; `NEO4J_URI` and `NEO4J_USER` fall
    /// back to local defaults.
    pub fn from_env() -> Result<Self, StoreError> {
        let password = std::env::var("NEO4J_PASSWORD")
            .map_err(|_| StoreError::Config("NEO4J_PASSWORD is not set".to_string()))?;
        Ok(Self {
            uri: std::env::var("NEO4J_URI").unwrap_or_else(|_| DEFAULT_URI.to_string()),
            user: std::env::var("NEO4J_USER").unwrap_or_else(|_| DEFAULT_USER.to_string()),
            password,
        })
    }
}

/// Current time as unix millis.
pub(crate) fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Sanitize a caller-supplied property key for interpolation into a
/// SET clause. Returns `None` when nothing sanitizable remains.
pub(crate) fn property_key(key: &str) -> Option<String> {
    let cleaned: String = key.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_').collect();
    if cleaned.is_empty() {
        return None;
    }
    let first = cleaned.chars().next()?;
    if first.is_ascii_alphabetic() || first == '_' {
        Some(cleaned)
    } else {
        Some(format!("_{cleaned}"))
    }
}
