use std::sync::Arc;
use std::time::Instant;

use futures_util::{stream, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::application::{EmbeddingService, StoreRepository};
use crate::domain::{
    normalize, CourseRecord, DomainError, FlatL2Index, NormalizedEntry, StoreFiles, VectorStore,
};

pub struct BuildIndexUseCase {
    embedding_service: Arc<dyn EmbeddingService>,
    store_repo: Arc<dyn StoreRepository>,
    concurrency: usize,
}

impl BuildIndexUseCase {
    pub fn new(
        embedding_service: Arc<dyn EmbeddingService>,
        store_repo: Arc<dyn StoreRepository>,
    ) -> Self {
        Self {
            embedding_service,
            store_repo,
            concurrency: 1,
        }
    }

    /// Number of embed calls allowed in flight at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Builds the store and persists it. Nothing is written if any record fails.
    pub async fn execute(&self, records: &[CourseRecord]) -> Result<StoreFiles, DomainError> {
        let store = self.build(records).await?;
        let files = self.store_repo.save(&store).await?;

        info!(
            "Saved {} records to {} and {}",
            files.record_count,
            files.index_path.display(),
            files.metadata_path.display()
        );

        Ok(files)
    }

    /// Normalizes and embeds every record in input order.
    ///
    /// Vector `i` and metadata `i` of the result both come from `records[i]`.
    /// The first failing record aborts the whole build.
    pub async fn build(&self, records: &[CourseRecord]) -> Result<VectorStore, DomainError> {
        if records.is_empty() {
            return Err(DomainError::invalid_input("no course records to index"));
        }

        let dimension = self.embedding_service.config().dimensions();
        info!(
            "Building index over {} records with {} ({} dimensions, concurrency {})",
            records.len(),
            self.embedding_service.config().model_name(),
            dimension,
            self.concurrency
        );

        let start_time = Instant::now();

        let entries: Vec<NormalizedEntry> = records.iter().map(normalize).collect();

        let progress_bar = ProgressBar::new(entries.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let embedding_service = self.embedding_service.as_ref();
        let progress = &progress_bar;

        // `buffered` yields in submission order, so completion order never
        // reaches the accumulated vectors.
        let embedded: Result<Vec<Vec<f32>>, DomainError> = stream::iter(entries.iter().enumerate())
            .map(|(position, entry)| async move {
                let vector = embedding_service.embed(entry.text()).await.map_err(|e| {
                    warn!("Failed to embed record {}: {}", position, e);
                    e
                })?;

                if vector.len() != dimension {
                    warn!(
                        "Record {} produced {} dimensions, expected {}",
                        position,
                        vector.len(),
                        dimension
                    );
                    return Err(DomainError::dimension_mismatch(dimension, vector.len()));
                }

                debug!("Embedded record {}", position);
                progress.inc(1);
                Ok::<_, DomainError>(vector)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await;

        let vectors = match embedded {
            Ok(vectors) => vectors,
            Err(e) => {
                progress_bar.abandon_with_message("aborted");
                return Err(e);
            }
        };
        progress_bar.finish_with_message("done");

        let index = FlatL2Index::from_vectors(dimension, &vectors)?;
        let store = VectorStore::new(index, entries)?;

        info!(
            "Index build complete: {} records in {:.2}s",
            store.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(store)
    }
}
