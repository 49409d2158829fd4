mod csv_record_reader;
mod file_lock;
mod file_store_repository;
mod http_embedding;
mod local_vector_repository;
mod mock_embedding;
mod ort_embedding;
mod qdrant_vector_repository;
mod timeout_embedding;

pub use csv_record_reader::*;
pub use file_lock::*;
pub use file_store_repository::*;
pub use http_embedding::*;
pub use local_vector_repository::*;
pub use mock_embedding::*;
pub use ort_embedding::*;
pub use qdrant_vector_repository::*;
pub use timeout_embedding::*;
