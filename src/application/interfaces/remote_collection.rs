use async_trait::async_trait;

use crate::domain::{DomainError, NormalizedEntry};

use super::VectorRepository;

/// A named network collection mirroring a local store.
#[async_trait]
pub trait RemoteCollection: VectorRepository {
    fn name(&self) -> &str;

    /// Creates the collection for L2 search if missing, or checks that the
    /// existing one uses L2 with the same vector size.
    async fn ensure_collection(&self, dimension: usize) -> Result<(), DomainError>;

    /// Writes `vectors[i]` with payload `entries[i]` under point id `start_position + i`.
    async fn upsert(
        &self,
        start_position: usize,
        vectors: &[Vec<f32>],
        entries: &[NormalizedEntry],
    ) -> Result<(), DomainError>;
}
