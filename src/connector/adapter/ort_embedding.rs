use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::application::EmbeddingService;
use crate::domain::{DomainError, EmbeddingConfig, DEFAULT_MODEL_NAME};

const BATCH_SIZE: usize = 32;

/// How token states are reduced to one vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Pooling {
    /// First token state. What BGE models are trained for.
    #[default]
    Cls,
    /// Attention-masked average of all token states.
    Mean,
}

/// Local ONNX embedding model, loaded once and shared.
pub struct OrtEmbedding {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    config: EmbeddingConfig,
    pooling: Pooling,
    uses_token_type_ids: bool,
}

impl OrtEmbedding {
    /// Downloads (or reuses from the HF cache) `model_id` and loads it.
    ///
    /// This is the expensive step; do it once per process.
    pub fn new(
        model_id: Option<&str>,
        dimensions: usize,
        max_sequence_length: usize,
        pooling: Pooling,
    ) -> Result<Self, DomainError> {
        let model_id = model_id.unwrap_or(DEFAULT_MODEL_NAME);
        info!(
            "Initializing ORT embedding service with model: {} ({:?} pooling)",
            model_id, pooling
        );

        let api = hf_hub::api::sync::ApiBuilder::new()
            .with_progress(true)
            .build()
            .map_err(|e| DomainError::embedding(format!("Failed to create HF API: {}", e)))?;

        let repo = api.model(model_id.to_string());

        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| DomainError::embedding(format!("Failed to download tokenizer: {}", e)))?;

        let model_path = repo
            .get("onnx/model.onnx")
            .or_else(|_| repo.get("model.onnx"))
            .map_err(|e| DomainError::embedding(format!("Failed to download ONNX model: {}", e)))?;

        // Large exports keep their weights in a sidecar file next to the graph.
        match repo.get("onnx/model.onnx_data") {
            Ok(path) => debug!("Fetched external weights: {:?}", path),
            Err(e) => debug!("No external weights for {}: {}", model_id, e),
        }

        let config = EmbeddingConfig::new(model_id.to_string(), dimensions, max_sequence_length);
        Self::from_paths(model_path, tokenizer_path, config, pooling)
    }

    pub fn from_paths(
        model_path: PathBuf,
        tokenizer_path: PathBuf,
        config: EmbeddingConfig,
        pooling: Pooling,
    ) -> Result<Self, DomainError> {
        info!("Loading ONNX model from: {:?}", model_path);

        let session = Session::builder()
            .map_err(|e| DomainError::embedding(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| DomainError::embedding(format!("Failed to set optimization level: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| DomainError::embedding(format!("Failed to load ONNX model: {}", e)))?;

        let uses_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| DomainError::embedding(format!("Failed to load tokenizer: {}", e)))?;

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            config,
            pooling,
            uses_token_type_ids,
        })
    }

    fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| DomainError::embedding(format!("Tokenization failed: {}", e)))?;

        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(self.config.max_sequence_length());

        let mut input_ids: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut attention_mask: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut token_type_ids: Vec<i64> = Vec::with_capacity(batch_size * max_len);

        // Tokens past the budget are dropped, so the cut point depends only on
        // the text and the configured length.
        for encoding in &encodings {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let type_ids = encoding.get_type_ids();

            let len = ids.len().min(max_len);

            input_ids.extend(ids[..len].iter().map(|&x| x as i64));
            attention_mask.extend(mask[..len].iter().map(|&x| x as i64));
            token_type_ids.extend(type_ids[..len].iter().map(|&x| x as i64));

            let padding = max_len - len;
            input_ids.extend(std::iter::repeat_n(0i64, padding));
            attention_mask.extend(std::iter::repeat_n(0i64, padding));
            token_type_ids.extend(std::iter::repeat_n(0i64, padding));
        }

        let shape = [batch_size, max_len];
        let input_ids_tensor = Tensor::from_array((shape, input_ids))
            .map_err(|e| DomainError::embedding(format!("Failed to create input_ids tensor: {}", e)))?;
        let attention_mask_tensor = Tensor::from_array((shape, attention_mask))
            .map_err(|e| DomainError::embedding(format!("Failed to create attention_mask tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| DomainError::internal(format!("Failed to lock session: {}", e)))?;

        let outputs = if self.uses_token_type_ids {
            let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids)).map_err(|e| {
                DomainError::embedding(format!("Failed to create token_type_ids tensor: {}", e))
            })?;
            session.run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor,
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
            ])
        }
        .map_err(|e| DomainError::embedding(format!("Inference failed: {}", e)))?;

        let output_value = outputs
            .iter()
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| DomainError::embedding("No output tensor found"))?;

        let (shape, data) = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| DomainError::embedding(format!("Failed to extract output tensor: {}", e)))?;

        let shape: Vec<usize> = shape.iter().map(|&x| x as usize).collect();
        debug!("Output tensor shape: {:?}", shape);

        let embeddings = if shape.len() == 3 {
            let seq_len = shape[1];
            let hidden_size = shape[2];

            (0..batch_size)
                .map(|i| {
                    let mut embedding = match self.pooling {
                        Pooling::Cls => {
                            let offset = i * seq_len * hidden_size;
                            data[offset..offset + hidden_size].to_vec()
                        }
                        Pooling::Mean => mean_pool(
                            data,
                            encodings[i].get_attention_mask(),
                            i,
                            seq_len.min(max_len),
                            seq_len,
                            hidden_size,
                        ),
                    };
                    l2_normalize(&mut embedding);
                    embedding
                })
                .collect()
        } else if shape.len() == 2 {
            let hidden_size = shape[1];

            (0..batch_size)
                .map(|i| {
                    let mut embedding: Vec<f32> = (0..hidden_size)
                        .map(|j| data[i * hidden_size + j])
                        .collect();
                    l2_normalize(&mut embedding);
                    embedding
                })
                .collect()
        } else {
            return Err(DomainError::embedding(format!(
                "Unexpected output tensor shape: {:?}",
                shape
            )));
        };

        Ok(embeddings)
    }
}

fn mean_pool(
    data: &[f32],
    mask: &[u32],
    batch_index: usize,
    tokens: usize,
    seq_len: usize,
    hidden_size: usize,
) -> Vec<f32> {
    let mut embedding = vec![0.0f32; hidden_size];
    let mut count = 0.0f32;

    for j in 0..tokens {
        let mask_val = if j < mask.len() { mask[j] as f32 } else { 0.0 };
        if mask_val > 0.0 {
            for (k, emb_k) in embedding.iter_mut().enumerate() {
                let idx = batch_index * seq_len * hidden_size + j * hidden_size + k;
                *emb_k += data[idx] * mask_val;
            }
            count += mask_val;
        }
    }

    if count > 0.0 {
        for v in &mut embedding {
            *v /= count;
        }
    }
    embedding
}

fn l2_normalize(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in embedding.iter_mut() {
            *v /= norm;
        }
    }
}

#[async_trait]
impl EmbeddingService for OrtEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let vectors = self.embed_texts(&[text])?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::embedding("Model returned no vector"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut all_vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(BATCH_SIZE) {
            let text_refs: Vec<&str> = batch.iter().map(|s| s.as_str()).collect();
            all_vectors.extend(self.embed_texts(&text_refs)?);
        }

        Ok(all_vectors)
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}
