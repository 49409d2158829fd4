use std::path::PathBuf;

use crate::domain::DomainError;

use super::{FlatL2Index, NormalizedEntry, SearchQuery, SearchResult};

/// A nearest-neighbor index plus the metadata describing each of its rows.
///
/// Row `i` of the index and `entries[i]` always describe the same record.
/// The constructor is the only way in and it refuses misaligned parts.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorStore {
    index: FlatL2Index,
    entries: Vec<NormalizedEntry>,
}

impl VectorStore {
    pub fn new(index: FlatL2Index, entries: Vec<NormalizedEntry>) -> Result<Self, DomainError> {
        if index.len() != entries.len() {
            return Err(DomainError::invalid_input(format!(
                "index holds {} vectors but metadata holds {} entries",
                index.len(),
                entries.len()
            )));
        }
        Ok(Self { index, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    pub fn entries(&self) -> &[NormalizedEntry] {
        &self.entries
    }

    pub fn entry(&self, position: usize) -> Option<&NormalizedEntry> {
        self.entries.get(position)
    }

    pub fn vector(&self, position: usize) -> Option<Vec<f32>> {
        self.index.reconstruct(position)
    }

    pub fn reconstruct_n(&self, offset: usize, count: usize) -> Result<Vec<Vec<f32>>, DomainError> {
        self.index.reconstruct_n(offset, count)
    }

    /// Exact top-K by ascending squared L2 distance.
    pub fn search(
        &self,
        query_vector: &[f32],
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let neighbors = self.index.search(query_vector, query.limit(), |position| {
            query.matches(&self.entries[position])
        })?;

        Ok(neighbors
            .into_iter()
            .map(|(position, distance)| {
                SearchResult::new(position as u64, distance, self.entries[position].clone())
            })
            .collect())
    }
}

/// Where a saved store ended up on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFiles {
    pub index_path: PathBuf,
    pub metadata_path: PathBuf,
    pub record_count: usize,
}
