use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::application::RemoteCollection;
use crate::domain::{DomainError, VectorStore};

pub const DEFAULT_PUSH_BATCH_SIZE: usize = 64;

/// Mirrors a local store into a remote collection, keyed by record position.
pub struct PushCollectionUseCase {
    remote: Arc<dyn RemoteCollection>,
    batch_size: usize,
}

impl PushCollectionUseCase {
    pub fn new(remote: Arc<dyn RemoteCollection>) -> Self {
        Self {
            remote,
            batch_size: DEFAULT_PUSH_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Returns the number of points written.
    pub async fn execute(&self, store: &VectorStore) -> Result<usize, DomainError> {
        info!(
            "Pushing {} records to collection {}",
            store.len(),
            self.remote.name()
        );
        let start_time = Instant::now();

        self.remote.ensure_collection(store.dimension()).await?;

        let progress_bar = ProgressBar::new(store.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut start = 0;
        while start < store.len() {
            let count = self.batch_size.min(store.len() - start);
            let vectors = store.reconstruct_n(start, count)?;
            let entries = &store.entries()[start..start + count];

            if let Err(e) = self.remote.upsert(start, &vectors, entries).await {
                progress_bar.abandon_with_message("aborted");
                return Err(e);
            }

            debug!("Pushed points {}..{}", start, start + count);
            progress_bar.inc(count as u64);
            start += count;
        }

        progress_bar.finish_with_message("done");
        info!(
            "Push complete: {} points in {:.2}s",
            store.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(store.len())
    }
}
