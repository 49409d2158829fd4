use async_trait::async_trait;
use tracing::debug;

use crate::application::VectorRepository;
use crate::domain::{DomainError, SearchQuery, SearchResult, VectorStore};

/// Searches a store held in memory, usually one just loaded from disk.
pub struct LocalVectorRepository {
    store: VectorStore,
}

impl LocalVectorRepository {
    pub fn new(store: VectorStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl VectorRepository for LocalVectorRepository {
    async fn search(
        &self,
        query_vector: &[f32],
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let results = self.store.search(query_vector, query)?;
        debug!(
            "Local search over {} vectors returned {} results",
            self.store.len(),
            results.len()
        );
        Ok(results)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.store.len() as u64)
    }
}
