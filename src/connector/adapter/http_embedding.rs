use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::EmbeddingService;
use crate::domain::{DomainError, EmbeddingConfig};

pub const EMBED_ENDPOINT_ENV: &str = "EMBED_ENDPOINT";

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingBody,
}

#[derive(Deserialize)]
struct EmbeddingBody {
    data: Vec<Vec<f32>>,
}

/// Remote embedding endpoint.
///
/// Sends `POST {"text": ...}` and expects `{"embedding": {"data": [[...]]}}`
/// back, the shape served by Workers AI style gateways. Input is cut to the
/// configured number of characters before it leaves the process.
pub struct HttpEmbedding {
    client: reqwest::Client,
    endpoint: String,
    config: EmbeddingConfig,
}

impl HttpEmbedding {
    pub fn new(
        endpoint: impl Into<String>,
        config: EmbeddingConfig,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(DomainError::invalid_input(format!(
                "embedding endpoint must be an http(s) URL, got '{}'",
                endpoint
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }
}

fn first_vector(body: EmbedResponse) -> Result<Vec<f32>, DomainError> {
    body.embedding
        .data
        .into_iter()
        .next()
        .filter(|vector| !vector.is_empty())
        .ok_or_else(|| DomainError::embedding("Embedding endpoint returned no vector"))
}

#[async_trait]
impl EmbeddingService for HttpEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let request = EmbedRequest {
            text: self.config.bound_input(text),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::embedding(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Embedding endpoint returned {}: {}", status, body);
            return Err(DomainError::embedding(format!(
                "Embedding endpoint returned {}",
                status
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| DomainError::embedding(format!("Malformed embedding response: {}", e)))?;

        let vector = first_vector(body)?;
        debug!("Received {}-dimensional embedding", vector.len());
        Ok(vector)
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}
