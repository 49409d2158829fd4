use async_trait::async_trait;

use crate::domain::{DomainError, SearchQuery, SearchResult};

/// Similarity search over an indexed set of course entries.
#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Returns up to `query.limit()` neighbors of `query_vector`, closest first.
    async fn search(
        &self,
        query_vector: &[f32],
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;
}
