use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::application::{RemoteCollection, VectorRepository};
use crate::domain::{
    CourseCategory, DomainError, NormalizedEntry, SearchQuery, SearchResult,
};

pub const QDRANT_URL_ENV: &str = "QDRANT_URL";
pub const QDRANT_API_KEY_ENV: &str = "QDRANT_API_KEY";
pub const QDRANT_COLLECTION_ENV: &str = "QDRANT_COLLECTION";
pub const DEFAULT_COLLECTION: &str = "WHUCoursesDB";

/// The only metric the local index speaks.
const EUCLID: &str = "Euclid";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the remote collection lives and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QdrantSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
}

impl QdrantSettings {
    /// Reads `QDRANT_URL` (required), `QDRANT_API_KEY` and `QDRANT_COLLECTION`.
    pub fn from_env() -> Result<Self, DomainError> {
        let url = std::env::var(QDRANT_URL_ENV).map_err(|_| {
            DomainError::invalid_input(format!(
                "{} is not set; pass --qdrant-url or export it",
                QDRANT_URL_ENV
            ))
        })?;
        let api_key = std::env::var(QDRANT_API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty());
        let collection = std::env::var(QDRANT_COLLECTION_ENV)
            .unwrap_or_else(|_| DEFAULT_COLLECTION.to_string());

        Ok(Self {
            url,
            api_key,
            collection,
        })
    }

    /// Environment values with any explicitly given flag taking precedence.
    pub fn resolve(url: Option<String>, collection: Option<String>) -> Result<Self, DomainError> {
        let mut settings = match url {
            Some(url) => Self {
                url,
                api_key: std::env::var(QDRANT_API_KEY_ENV)
                    .ok()
                    .filter(|key| !key.is_empty()),
                collection: std::env::var(QDRANT_COLLECTION_ENV)
                    .unwrap_or_else(|_| DEFAULT_COLLECTION.to_string()),
            },
            None => Self::from_env()?,
        };
        if let Some(collection) = collection {
            settings.collection = collection;
        }
        Ok(settings)
    }
}

/// Qdrant collection accessed over its REST API.
///
/// Scores are only comparable with the local index when the collection
/// ranks by Euclid, so the first search checks that before querying.
pub struct QdrantVectorRepository {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
    verified: OnceCell<()>,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct CollectionInfo {
    config: CollectionConfig,
}

#[derive(Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Deserialize)]
struct CollectionParams {
    vectors: VectorParams,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct VectorParams {
    size: usize,
    distance: String,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f32,
    payload: Option<Payload>,
}

#[derive(Deserialize)]
struct Payload {
    text: String,
    category: CourseCategory,
}

#[derive(Deserialize)]
struct CountResult {
    count: u64,
}

impl QdrantVectorRepository {
    pub fn new(settings: QdrantSettings) -> Result<Self, DomainError> {
        if !(settings.url.starts_with("http://") || settings.url.starts_with("https://")) {
            return Err(DomainError::invalid_input(format!(
                "Qdrant URL must be http(s), got '{}'",
                settings.url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DomainError::retrieval(format!("Failed to build HTTP client: {}", e)))?;

        debug!(
            "Using Qdrant collection {} at {}",
            settings.collection, settings.url
        );

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key,
            collection: settings.collection,
            verified: OnceCell::new(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, DomainError> {
        let response = builder
            .send()
            .await
            .map_err(|e| DomainError::retrieval(format!("Qdrant request failed: {}", e)))?;

        self.check_status(response).await
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DomainError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("Qdrant returned {}: {}", status, body);
        Err(DomainError::retrieval(format!(
            "Qdrant returned {} for collection {}: {}",
            status, self.collection, body
        )))
    }

    /// Vector parameters of the collection, or `None` if it does not exist.
    async fn vector_params(&self) -> Result<Option<VectorParams>, DomainError> {
        let response = self
            .request(reqwest::Method::GET, self.collection_url())
            .send()
            .await
            .map_err(|e| DomainError::retrieval(format!("Qdrant request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = self.check_status(response).await?;
        let info: CollectionInfo = Self::read_json(response).await?;
        Ok(Some(info.config.params.vectors))
    }

    async fn verify_for_search(&self, dimension: usize) -> Result<(), DomainError> {
        let params = self.vector_params().await?.ok_or_else(|| {
            DomainError::retrieval(format!("collection {} does not exist", self.collection))
        })?;
        check_vector_params(&self.collection, &params, dimension)?;
        debug!("Collection {} ranks by {}", self.collection, EUCLID);
        Ok(())
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, DomainError> {
        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| DomainError::retrieval(format!("Malformed Qdrant response: {}", e)))?;
        Ok(body.result)
    }
}

fn create_collection_body(dimension: usize) -> Value {
    json!({
        "vectors": {
            "size": dimension,
            "distance": EUCLID,
        }
    })
}

fn upsert_body(start_position: usize, vectors: &[Vec<f32>], entries: &[NormalizedEntry]) -> Value {
    let points: Vec<Value> = vectors
        .iter()
        .zip(entries)
        .enumerate()
        .map(|(i, (vector, entry))| {
            json!({
                "id": (start_position + i) as u64,
                "vector": vector,
                "payload": entry,
            })
        })
        .collect();

    json!({ "points": points })
}

fn search_body(query_vector: &[f32], query: &SearchQuery) -> Value {
    let mut body = json!({
        "vector": query_vector,
        "limit": query.limit(),
        "with_payload": true,
    });

    if let Some(category) = query.category() {
        body["filter"] = json!({
            "must": [
                { "key": "category", "match": { "value": category.code() } }
            ]
        });
    }

    body
}

fn check_vector_params(
    collection: &str,
    params: &VectorParams,
    dimension: usize,
) -> Result<(), DomainError> {
    if params.distance != EUCLID {
        return Err(DomainError::retrieval(format!(
            "collection {} uses {} distance; local index ranks by L2 ({})",
            collection, params.distance, EUCLID
        )));
    }
    if params.size != dimension {
        return Err(DomainError::retrieval(format!(
            "collection {} holds {}-dimensional vectors, local index has {}",
            collection, params.size, dimension
        )));
    }
    Ok(())
}

fn to_search_result(point: ScoredPoint) -> Result<SearchResult, DomainError> {
    let position = point
        .id
        .as_u64()
        .ok_or_else(|| DomainError::retrieval(format!("unexpected point id {}", point.id)))?;

    let payload = point.payload.ok_or_else(|| {
        DomainError::retrieval(format!("point {} was returned without payload", position))
    })?;

    Ok(SearchResult::new(
        position,
        point.score,
        NormalizedEntry::new(payload.text, payload.category),
    ))
}

fn parse_search_response(value: Value) -> Result<Vec<SearchResult>, DomainError> {
    let body: ApiResponse<Vec<ScoredPoint>> = serde_json::from_value(value)
        .map_err(|e| DomainError::retrieval(format!("Malformed Qdrant search response: {}", e)))?;

    body.result.into_iter().map(to_search_result).collect()
}

#[async_trait]
impl VectorRepository for QdrantVectorRepository {
    async fn search(
        &self,
        query_vector: &[f32],
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, DomainError> {
        self.verified
            .get_or_try_init(|| self.verify_for_search(query_vector.len()))
            .await?;

        let url = format!("{}/points/search", self.collection_url());
        let response = self
            .send(
                self.request(reqwest::Method::POST, url)
                    .json(&search_body(query_vector, query)),
            )
            .await?;

        let value: Value = response
            .json()
            .await
            .map_err(|e| DomainError::retrieval(format!("Malformed Qdrant response: {}", e)))?;

        let results = parse_search_response(value)?;
        debug!("Qdrant returned {} results", results.len());
        Ok(results)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let url = format!("{}/points/count", self.collection_url());
        let response = self
            .send(
                self.request(reqwest::Method::POST, url)
                    .json(&json!({ "exact": true })),
            )
            .await?;

        let result: CountResult = Self::read_json(response).await?;
        Ok(result.count)
    }
}

#[async_trait]
impl RemoteCollection for QdrantVectorRepository {
    fn name(&self) -> &str {
        &self.collection
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), DomainError> {
        match self.vector_params().await? {
            None => {
                info!(
                    "Creating collection {} ({} dimensions, {})",
                    self.collection, dimension, EUCLID
                );
                self.send(
                    self.request(reqwest::Method::PUT, self.collection_url())
                        .json(&create_collection_body(dimension)),
                )
                .await?;
            }
            Some(params) => {
                check_vector_params(&self.collection, &params, dimension)?;
                debug!("Collection {} already exists and matches", self.collection);
            }
        }
        Ok(())
    }

    async fn upsert(
        &self,
        start_position: usize,
        vectors: &[Vec<f32>],
        entries: &[NormalizedEntry],
    ) -> Result<(), DomainError> {
        if vectors.len() != entries.len() {
            return Err(DomainError::invalid_input(format!(
                "{} vectors but {} payloads",
                vectors.len(),
                entries.len()
            )));
        }
        if vectors.is_empty() {
            return Ok(());
        }

        let url = format!("{}/points?wait=true", self.collection_url());
        self.send(
            self.request(reqwest::Method::PUT, url)
                .json(&upsert_body(start_position, vectors, entries)),
        )
        .await?;

        Ok(())
    }
}
