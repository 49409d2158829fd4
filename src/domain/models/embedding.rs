use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL_NAME: &str = "BAAI/bge-m3";
pub const DEFAULT_DIMENSIONS: usize = 1024;
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 512;

/// Configuration for the embedding model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    model_name: String,
    dimensions: usize,
    max_sequence_length: usize,
}

impl EmbeddingConfig {
    pub fn new(model_name: String, dimensions: usize, max_sequence_length: usize) -> Self {
        Self {
            model_name,
            dimensions,
            max_sequence_length: max_sequence_length.max(1),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }

    /// Cuts `text` to at most `max_sequence_length` characters.
    ///
    /// Used by providers that bound input by characters rather than tokens.
    pub fn bound_input<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.max_sequence_length) {
            Some((byte_index, _)) => &text[..byte_index],
            None => text,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
        }
    }
}
