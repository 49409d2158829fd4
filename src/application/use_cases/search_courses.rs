use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::application::{EmbeddingService, VectorRepository};
use crate::domain::{DomainError, SearchQuery, SearchResult};

pub struct SearchCoursesUseCase {
    vector_repo: Arc<dyn VectorRepository>,
}

impl SearchCoursesUseCase {
    pub fn new(vector_repo: Arc<dyn VectorRepository>) -> Self {
        Self { vector_repo }
    }

    pub async fn search_by_vector(
        &self,
        query_vector: &[f32],
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, DomainError> {
        info!("Searching ({})", query.summary());

        let start_time = Instant::now();
        let results = self.vector_repo.search(query_vector, query).await?;

        info!(
            "Found {} results in {:.2}s",
            results.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(results)
    }

    /// Embeds `text` with the same provider the store was built with, then searches.
    pub async fn search_by_text(
        &self,
        embedding_service: &dyn EmbeddingService,
        text: &str,
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::invalid_input("query text must not be empty"));
        }

        let query_vector = embedding_service.embed(text).await?;
        self.search_by_vector(&query_vector, query).await
    }
}
