//! Domain services containing pure record transformations.

mod normalizer;

pub use normalizer::*;
