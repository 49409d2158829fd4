use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::{
    BuildIndexUseCase, EmbeddingConfig, EmbeddingService, FileStoreRepository, HttpEmbedding,
    LocalVectorRepository, MockEmbedding, OrtEmbedding, Pooling, PushCollectionUseCase,
    QdrantSettings, QdrantVectorRepository, SearchCoursesUseCase, StoreRepository,
    TimeoutEmbedding, VectorStore,
};

pub struct ContainerConfig {
    pub db_dir: PathBuf,
    pub mock_embeddings: bool,
    /// Remote embedding endpoint; takes precedence over the local model.
    pub embed_endpoint: Option<String>,
    /// Hugging Face model id for the local ONNX model.
    pub model: Option<String>,
    pub pooling: Pooling,
    pub dimensions: usize,
    pub max_length: usize,
    pub concurrency: usize,
    pub timeout: Duration,
    pub qdrant_url: Option<String>,
    pub collection: Option<String>,
}

/// Wires adapters to use cases for one CLI invocation.
///
/// The embedding provider is created on first use, so commands that never
/// embed (such as `push`) do not pay for loading a model.
pub struct Container {
    embedding_service: OnceCell<Arc<dyn EmbeddingService>>,
    store_repo: Arc<FileStoreRepository>,
    config: ContainerConfig,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            embedding_service: OnceCell::new(),
            store_repo: Arc::new(FileStoreRepository::new(config.db_dir.clone())),
            config,
        }
    }

    pub async fn embedding_service(&self) -> Result<Arc<dyn EmbeddingService>> {
        let service = self
            .embedding_service
            .get_or_try_init(|| async { self.create_embedding_service() })
            .await?;
        Ok(service.clone())
    }

    fn create_embedding_service(&self) -> Result<Arc<dyn EmbeddingService>> {
        let config = &self.config;

        if config.mock_embeddings {
            debug!("Using mock embedding service");
            return Ok(Arc::new(MockEmbedding::with_config(EmbeddingConfig::new(
                "mock-embedding".to_string(),
                config.dimensions,
                config.max_length,
            ))));
        }

        if let Some(endpoint) = config.embed_endpoint.as_deref() {
            debug!("Using HTTP embedding endpoint {}", endpoint);
            let embedding_config =
                EmbeddingConfig::new(endpoint.to_string(), config.dimensions, config.max_length);
            return Ok(Arc::new(HttpEmbedding::new(
                endpoint,
                embedding_config,
                config.timeout,
            )?));
        }

        debug!("Initializing ONNX embedding service...");
        let ort = OrtEmbedding::new(
            config.model.as_deref(),
            config.dimensions,
            config.max_length,
            config.pooling,
        )?;
        Ok(Arc::new(TimeoutEmbedding::new(Arc::new(ort), config.timeout)))
    }

    pub fn store_repo(&self) -> Arc<dyn StoreRepository> {
        self.store_repo.clone()
    }

    pub async fn load_store(&self) -> Result<VectorStore> {
        Ok(self.store_repo.load().await?)
    }

    pub fn remote_collection(&self) -> Result<Arc<QdrantVectorRepository>> {
        let settings =
            QdrantSettings::resolve(self.config.qdrant_url.clone(), self.config.collection.clone())?;
        Ok(Arc::new(QdrantVectorRepository::new(settings)?))
    }

    pub async fn build_use_case(&self) -> Result<BuildIndexUseCase> {
        Ok(
            BuildIndexUseCase::new(self.embedding_service().await?, self.store_repo())
                .with_concurrency(self.config.concurrency),
        )
    }

    pub fn local_search_use_case(&self, store: VectorStore) -> SearchCoursesUseCase {
        SearchCoursesUseCase::new(Arc::new(LocalVectorRepository::new(store)))
    }

    pub fn remote_search_use_case(&self) -> Result<SearchCoursesUseCase> {
        Ok(SearchCoursesUseCase::new(self.remote_collection()?))
    }

    pub fn push_use_case(&self, batch_size: usize) -> Result<PushCollectionUseCase> {
        Ok(PushCollectionUseCase::new(self.remote_collection()?).with_batch_size(batch_size))
    }

    pub fn db_dir(&self) -> &Path {
        &self.config.db_dir
    }
}
