//! # Application Layer
//!
//! Service interfaces and the use cases that orchestrate domain and connector layers.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
