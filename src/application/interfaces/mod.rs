mod embedding_service;
mod remote_collection;
mod store_repository;
mod vector_repository;

pub use embedding_service::*;
pub use remote_collection::*;
pub use store_repository::*;
pub use vector_repository::*;
