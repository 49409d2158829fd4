use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::application::EmbeddingService;
use crate::domain::{DomainError, EmbeddingConfig, DEFAULT_DIMENSIONS, DEFAULT_MAX_SEQUENCE_LENGTH};

/// Offline embedding provider: a seeded pseudo-random unit vector per text.
///
/// Identical (bounded) input always yields the identical vector.
pub struct MockEmbedding {
    config: EmbeddingConfig,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            config: EmbeddingConfig::new(
                "mock-embedding".to_string(),
                dimensions,
                DEFAULT_MAX_SEQUENCE_LENGTH,
            ),
        }
    }

    pub fn with_config(config: EmbeddingConfig) -> Self {
        Self { config }
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let text = self.config.bound_input(text);

        let mut rng = rand::rngs::StdRng::seed_from_u64(seed_for(text));
        let mut vector: Vec<f32> = (0..self.config.dimensions())
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for x in &mut vector {
                *x /= magnitude;
            }
        }

        vector
    }
}

/// First eight bytes of the text's SHA-256, so a db built with one binary
/// can be queried by another.
fn seed_for(text: &str) -> u64 {
    let hash = Sha256::digest(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(bytes)
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        Ok(self.generate_embedding(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let vectors: Vec<Vec<f32>> = texts
            .iter()
            .map(|text| self.generate_embedding(text))
            .collect();

        debug!("Generated {} mock embeddings", vectors.len());

        Ok(vectors)
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedding_consistency() {
        let service = MockEmbedding::new();

        let embedding1 = service.embed("hello world").await.unwrap();
        let embedding2 = service.embed("hello world").await.unwrap();

        assert_eq!(embedding1, embedding2);
    }

    #[test]
    fn seeds_are_pinned_to_sha256() {
        // sha256("") = e3b0c442 98fc1c14 ..., sha256("abc") = ba7816bf 8f01cfea ...
        assert_eq!(seed_for(""), 0x141c_fc98_42c4_b0e3);
        assert_eq!(seed_for("abc"), 0xeacf_018f_bf16_78ba);
    }

    #[tokio::test]
    async fn test_mock_embedding_dimensions() {
        let service = MockEmbedding::with_dimensions(128);

        let embedding = service.embed("test").await.unwrap();

        assert_eq!(embedding.len(), 128);
    }

    #[tokio::test]
    async fn test_mock_embedding_normalized() {
        let service = MockEmbedding::new();

        let embedding = service.embed("test").await.unwrap();
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();

        assert!((magnitude - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn batch_matches_single_calls() {
        let service = MockEmbedding::with_dimensions(16);
        let texts = vec!["课程".to_string(), "评价".to_string(), "".to_string()];

        let batch = service.embed_batch(&texts).await.unwrap();

        for (text, vector) in texts.iter().zip(batch) {
            assert_eq!(service.embed(text).await.unwrap(), vector);
        }
    }

    #[tokio::test]
    async fn input_past_the_budget_is_ignored() {
        let service = MockEmbedding::with_config(EmbeddingConfig::new("m".to_string(), 8, 4));

        let a = service.embed("abcdXXXX").await.unwrap();
        let b = service.embed("abcdYYYY").await.unwrap();
        let c = service.embed("abceXXXX").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
