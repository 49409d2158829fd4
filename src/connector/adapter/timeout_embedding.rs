use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::application::EmbeddingService;
use crate::domain::{DomainError, EmbeddingConfig};

/// Bounds every call to the wrapped provider by a deadline.
pub struct TimeoutEmbedding {
    inner: Arc<dyn EmbeddingService>,
    timeout: Duration,
}

impl TimeoutEmbedding {
    pub fn new(inner: Arc<dyn EmbeddingService>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl EmbeddingService for TimeoutEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        match tokio::time::timeout(self.timeout, self.inner.embed(text)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Embedding call exceeded {:?}", self.timeout);
                Err(DomainError::embedding(format!(
                    "embedding timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        tokio::time::timeout(self.timeout, self.inner.embed_batch(texts))
            .await
            .map_err(|_| {
                DomainError::embedding(format!("embedding timed out after {:?}", self.timeout))
            })?
    }

    fn config(&self) -> &EmbeddingConfig {
        self.inner.config()
    }
}
