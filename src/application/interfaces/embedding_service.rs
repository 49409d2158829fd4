use async_trait::async_trait;

use crate::domain::{DomainError, EmbeddingConfig};

/// Turns text into a fixed-length vector.
///
/// Implementations are built once and shared by reference; any model loading
/// happens in their constructor, never per call.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// Embeds many texts at once. Must yield the same vector per item as
    /// calling [`EmbeddingService::embed`] on each one.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    fn config(&self) -> &EmbeddingConfig;
}
