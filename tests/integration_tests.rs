//! Integration tests for the course index pipeline.
//!
//! These run the build, persistence and search paths end to end with a
//! deterministic embedding provider and scratch directories.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use coursesearch::domain::{preview, FIELD_COURSE_NAME, FIELD_COURSE_TYPE, FIELD_INSTRUCTOR};
use coursesearch::{
    normalize, BuildIndexUseCase, CourseCategory, CourseRecord, CsvRecordReader, DomainError,
    EmbeddingConfig, EmbeddingService, FileStoreRepository, LocalVectorRepository, MockEmbedding,
    NormalizedEntry, PushCollectionUseCase, RemoteCollection, SearchCoursesUseCase, SearchQuery,
    SearchResult, StoreRepository, VectorRepository,
};

const DIM: usize = 32;

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/courses.csv")
}

fn two_records() -> Vec<CourseRecord> {
    vec![
        CourseRecord::new()
            .with_field(FIELD_COURSE_NAME, "计算机网络")
            .with_field(FIELD_INSTRUCTOR, "张三")
            .with_field(FIELD_COURSE_TYPE, "专业课程"),
        CourseRecord::new()
            .with_field(FIELD_COURSE_NAME, "体育(一)")
            .with_field(FIELD_COURSE_TYPE, "体育课"),
    ]
}

fn numbered_records(n: usize) -> Vec<CourseRecord> {
    (0..n)
        .map(|i| CourseRecord::new().with_field(FIELD_COURSE_NAME, format!("课程{}", i)))
        .collect()
}

fn build_use_case(
    embedding: Arc<dyn EmbeddingService>,
    dir: &Path,
) -> (BuildIndexUseCase, Arc<FileStoreRepository>) {
    let repo = Arc::new(FileStoreRepository::new(dir));
    (BuildIndexUseCase::new(embedding, repo.clone()), repo)
}

/// Fails on the `fail_at`-th call.
struct FailingEmbedding {
    inner: MockEmbedding,
    calls: AtomicUsize,
    fail_at: usize,
}

#[async_trait]
impl EmbeddingService for FailingEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_at {
            return Err(DomainError::embedding("provider unavailable"));
        }
        self.inner.embed(text).await
    }

    fn config(&self) -> &EmbeddingConfig {
        self.inner.config()
    }
}

/// Returns one short vector on the `short_at`-th call.
struct ShortVectorEmbedding {
    inner: MockEmbedding,
    calls: AtomicUsize,
    short_at: usize,
}

#[async_trait]
impl EmbeddingService for ShortVectorEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let mut vector = self.inner.embed(text).await?;
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.short_at {
            vector.pop();
        }
        Ok(vector)
    }

    fn config(&self) -> &EmbeddingConfig {
        self.inner.config()
    }
}

/// Completes earlier calls later, so completion order is the reverse of submission order.
struct SlowFirstEmbedding {
    inner: MockEmbedding,
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingService for SlowFirstEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = 40u64.saturating_sub(call as u64 * 5);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.inner.embed(text).await
    }

    fn config(&self) -> &EmbeddingConfig {
        self.inner.config()
    }
}

/// Remote collection that records what it was sent.
#[derive(Default)]
struct RecordingCollection {
    ensured: Mutex<Vec<usize>>,
    batches: Mutex<Vec<(usize, usize)>>,
    points: Mutex<Vec<(u64, Vec<f32>, NormalizedEntry)>>,
}

#[async_trait]
impl VectorRepository for RecordingCollection {
    async fn search(
        &self,
        _query_vector: &[f32],
        _query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, DomainError> {
        Ok(vec![])
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.points.lock().unwrap().len() as u64)
    }
}

#[async_trait]
impl RemoteCollection for RecordingCollection {
    fn name(&self) -> &str {
        "test-collection"
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), DomainError> {
        self.ensured.lock().unwrap().push(dimension);
        Ok(())
    }

    async fn upsert(
        &self,
        start_position: usize,
        vectors: &[Vec<f32>],
        entries: &[NormalizedEntry],
    ) -> Result<(), DomainError> {
        self.batches
            .lock()
            .unwrap()
            .push((start_position, vectors.len()));
        let mut points = self.points.lock().unwrap();
        for (i, (vector, entry)) in vectors.iter().zip(entries).enumerate() {
            points.push(((start_position + i) as u64, vector.clone(), entry.clone()));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_end_to_end_build_and_search() {
    let dir = tempfile::tempdir().unwrap();
    let embedding: Arc<dyn EmbeddingService> = Arc::new(MockEmbedding::with_dimensions(DIM));
    let (use_case, repo) = build_use_case(embedding.clone(), dir.path());

    let files = use_case.execute(&two_records()).await.unwrap();
    assert_eq!(files.record_count, 2);

    let store = repo.load().await.unwrap();
    let categories: Vec<u8> = store.entries().iter().map(|e| e.category().code()).collect();
    assert_eq!(categories, vec![4, 1]);

    let first_text = store.entries()[0].text().to_string();
    let search = SearchCoursesUseCase::new(Arc::new(LocalVectorRepository::new(store)));
    let results = search
        .search_by_text(embedding.as_ref(), &first_text, &SearchQuery::new())
        .await
        .unwrap();

    assert_eq!(results[0].position(), 0);
    assert!(results[0].score().abs() < 1e-5);
    assert_eq!(results[0].entry().text(), first_text);
}

#[tokio::test]
async fn test_positions_align_with_input_order() {
    let embedding = MockEmbedding::with_dimensions(DIM);
    let records = numbered_records(10);
    let dir = tempfile::tempdir().unwrap();
    let (use_case, _) = build_use_case(Arc::new(MockEmbedding::with_dimensions(DIM)), dir.path());

    let store = use_case.build(&records).await.unwrap();

    for (i, record) in records.iter().enumerate() {
        let expected = normalize(record);
        assert_eq!(store.entry(i), Some(&expected));
        assert_eq!(
            store.vector(i).unwrap(),
            embedding.embed(expected.text()).await.unwrap()
        );
    }
}

#[tokio::test]
async fn test_concurrent_build_keeps_positions() {
    let dir = tempfile::tempdir().unwrap();
    let records = numbered_records(8);

    let (sequential, _) =
        build_use_case(Arc::new(MockEmbedding::with_dimensions(DIM)), dir.path());
    let expected = sequential.build(&records).await.unwrap();

    let slow = Arc::new(SlowFirstEmbedding {
        inner: MockEmbedding::with_dimensions(DIM),
        calls: AtomicUsize::new(0),
    });
    let (concurrent, _) = build_use_case(slow, dir.path());
    let actual = concurrent.with_concurrency(8).build(&records).await.unwrap();

    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_round_trip_fidelity() {
    let dir = tempfile::tempdir().unwrap();
    let (use_case, repo) =
        build_use_case(Arc::new(MockEmbedding::with_dimensions(DIM)), dir.path());

    let built = use_case.build(&numbered_records(5)).await.unwrap();
    repo.save(&built).await.unwrap();
    let loaded = repo.load().await.unwrap();

    assert_eq!(loaded, built);
}

#[tokio::test]
async fn test_embedding_failure_aborts_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db");
    let failing = Arc::new(FailingEmbedding {
        inner: MockEmbedding::with_dimensions(DIM),
        calls: AtomicUsize::new(0),
        fail_at: 1,
    });
    let (use_case, repo) = build_use_case(failing, &db);

    let err = use_case.execute(&two_records()).await.unwrap_err();

    assert!(err.is_embedding_failure());
    assert!(!repo.index_path().exists());
    assert!(!repo.metadata_path().exists());
}

#[tokio::test]
async fn test_dimension_mismatch_aborts_build() {
    let dir = tempfile::tempdir().unwrap();
    let short = Arc::new(ShortVectorEmbedding {
        inner: MockEmbedding::with_dimensions(DIM),
        calls: AtomicUsize::new(0),
        short_at: 2,
    });
    let (use_case, repo) = build_use_case(short, dir.path());

    let err = use_case.execute(&numbered_records(4)).await.unwrap_err();

    assert!(err.is_dimension_mismatch());
    assert!(!repo.index_path().exists());
}

#[tokio::test]
async fn test_empty_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (use_case, _) = build_use_case(Arc::new(MockEmbedding::with_dimensions(DIM)), dir.path());

    let err = use_case.build(&[]).await.unwrap_err();

    assert!(matches!(err, DomainError::InvalidInput(_)));
}

#[tokio::test]
async fn test_build_from_csv_fixture() {
    let records = CsvRecordReader::read_path(&fixture_path()).unwrap();
    assert_eq!(records.len(), 3);

    let dir = tempfile::tempdir().unwrap();
    let (use_case, repo) =
        build_use_case(Arc::new(MockEmbedding::with_dimensions(DIM)), dir.path());
    use_case.execute(&records).await.unwrap();

    let store = repo.load().await.unwrap();
    let categories: Vec<CourseCategory> = store.entries().iter().map(|e| e.category()).collect();
    assert_eq!(
        categories,
        vec![
            CourseCategory::Major,
            CourseCategory::PhysicalEducation,
            CourseCategory::English
        ]
    );
    assert!(store.entries()[1].text().contains("轻松\n愉快"));
}

#[tokio::test]
async fn test_gbk_csv_reads_like_utf8() {
    let utf8 = std::fs::read_to_string(fixture_path()).unwrap();
    let (gbk_bytes, _, had_errors) = encoding_rs::GBK.encode(&utf8);
    assert!(!had_errors);

    let dir = tempfile::tempdir().unwrap();
    let gbk_path = dir.path().join("courses_gbk.csv");
    std::fs::write(&gbk_path, &gbk_bytes).unwrap();

    let from_gbk = CsvRecordReader::read_path(&gbk_path).unwrap();
    let from_utf8 = CsvRecordReader::read_path(&fixture_path()).unwrap();

    assert_eq!(from_gbk, from_utf8);
}

#[tokio::test]
async fn test_category_filter_on_local_search() {
    let dir = tempfile::tempdir().unwrap();
    let embedding: Arc<dyn EmbeddingService> = Arc::new(MockEmbedding::with_dimensions(DIM));
    let (use_case, _) = build_use_case(embedding.clone(), dir.path());
    let store = use_case.build(&two_records()).await.unwrap();

    let search = SearchCoursesUseCase::new(Arc::new(LocalVectorRepository::new(store)));
    let query = SearchQuery::new()
        .with_limit(5)
        .with_category(CourseCategory::PhysicalEducation);
    let results = search
        .search_by_text(embedding.as_ref(), "体育", &query)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].position(), 1);
}

#[tokio::test]
async fn test_push_mirrors_store_by_position() {
    let dir = tempfile::tempdir().unwrap();
    let (use_case, _) = build_use_case(Arc::new(MockEmbedding::with_dimensions(DIM)), dir.path());
    let store = use_case.build(&numbered_records(5)).await.unwrap();

    let remote = Arc::new(RecordingCollection::default());
    let pushed = PushCollectionUseCase::new(remote.clone())
        .with_batch_size(2)
        .execute(&store)
        .await
        .unwrap();

    assert_eq!(pushed, 5);
    assert_eq!(*remote.ensured.lock().unwrap(), vec![DIM]);
    assert_eq!(*remote.batches.lock().unwrap(), vec![(0, 2), (2, 2), (4, 1)]);

    let points = remote.points.lock().unwrap();
    for (id, vector, entry) in points.iter() {
        let position = *id as usize;
        assert_eq!(Some(vector.clone()), store.vector(position));
        assert_eq!(Some(entry), store.entry(position));
    }
}

#[test]
fn test_preview_truncation() {
    let long = "课".repeat(200);
    let short = "评".repeat(50);

    let cut = preview(&long, 120);
    assert_eq!(cut.chars().count(), 123);
    assert!(cut.ends_with("..."));
    assert_eq!(cut.trim_end_matches('.'), "课".repeat(120));

    assert_eq!(preview(&short, 120), short);
}
