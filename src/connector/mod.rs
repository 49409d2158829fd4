//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Embedding providers (local ONNX model, HTTP endpoint, deterministic mock)
//! - Storage (bincode index plus JSON metadata on disk, Qdrant over REST)
//! - CSV input with encoding fallback
//! - The CLI-facing container, router and controllers

pub mod adapter;
pub mod api;

pub use adapter::*;
