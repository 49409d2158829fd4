use async_trait::async_trait;

use crate::domain::{DomainError, StoreFiles, VectorStore};

/// Durable storage for a built [`VectorStore`].
#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn save(&self, store: &VectorStore) -> Result<StoreFiles, DomainError>;

    async fn load(&self) -> Result<VectorStore, DomainError>;
}
