//! The boundary between the registry and whatever persists the route catalog. The registry only
//! ever talks to this trait; it never touches SQLite directly.

mod sqlite;

pub use sqlite::SqliteCatalogLoader;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{RouteConfig, UpstreamConfig};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog storage error: {0}")]
    Storage(String),
    #[error("malformed catalog row: {0}")]
    MalformedRow(String),
}

/// Yields the full route and upstream catalog. Implementations must be deterministic per call;
/// the registry treats every call as a fresh, independent snapshot.
#[async_trait]
pub trait CatalogLoader: Send + Sync {
    async fn load_all(&self) -> Result<(Vec<RouteConfig>, Vec<UpstreamConfig>), CatalogError>;
}
