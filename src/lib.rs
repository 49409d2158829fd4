pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    BuildIndexUseCase, EmbeddingService, PushCollectionUseCase, RemoteCollection,
    SearchCoursesUseCase, StoreRepository, VectorRepository, DEFAULT_PUSH_BATCH_SIZE,
};

pub use cli::Commands;

pub use connector::{
    CsvRecordReader, FileLock, FileStoreRepository, HttpEmbedding, LocalVectorRepository,
    MockEmbedding, OrtEmbedding, Pooling, QdrantSettings, QdrantVectorRepository, TimeoutEmbedding,
};

pub use domain::{
    normalize, CourseCategory, CourseRecord, DomainError, EmbeddingConfig, FlatL2Index,
    NormalizedEntry, SearchQuery, SearchResult, StoreFiles, VectorStore,
};
