use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Input not found: {0}")]
    InputNotFound(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Embedding failure: {0}")]
    EmbeddingFailure(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Retrieval failure: {0}")]
    RetrievalFailure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn input_not_found(msg: impl Into<String>) -> Self {
        Self::InputNotFound(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::EncodingError(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingFailure(msg.into())
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::PersistenceError(msg.into())
    }

    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::RetrievalFailure(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_input_not_found(&self) -> bool {
        matches!(self, Self::InputNotFound(_))
    }

    pub fn is_encoding_error(&self) -> bool {
        matches!(self, Self::EncodingError(_))
    }

    pub fn is_embedding_failure(&self) -> bool {
        matches!(self, Self::EmbeddingFailure(_))
    }

    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. })
    }

    pub fn is_persistence_error(&self) -> bool {
        matches!(self, Self::PersistenceError(_))
    }

    pub fn is_retrieval_failure(&self) -> bool {
        matches!(self, Self::RetrievalFailure(_))
    }
}
