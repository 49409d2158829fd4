use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Nearest-neighbor index structures a store can be built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    /// Brute-force scan over squared Euclidean distance. Always exact.
    FlatL2,
}

/// Exact nearest-neighbor index over a dense `(N, D)` matrix of vectors.
///
/// Query cost is O(N·D). Row `i` is the `i`-th vector added, which is what the
/// metadata store aligns against.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    vectors: Array2<f32>,
}

impl FlatL2Index {
    /// Stacks `vectors` into one matrix, rejecting any row whose length is not `dimension`.
    pub fn from_vectors(dimension: usize, vectors: &[Vec<f32>]) -> Result<Self, DomainError> {
        let mut data = Vec::with_capacity(vectors.len() * dimension);
        for vector in vectors {
            if vector.len() != dimension {
                return Err(DomainError::dimension_mismatch(dimension, vector.len()));
            }
            data.extend_from_slice(vector);
        }
        Self::from_raw(dimension, vectors.len(), data)
    }

    /// Rebuilds an index from row-major data, as written by [`FlatL2Index::to_raw_vec`].
    pub fn from_raw(dimension: usize, count: usize, data: Vec<f32>) -> Result<Self, DomainError> {
        let vectors = Array2::from_shape_vec((count, dimension), data).map_err(|e| {
            DomainError::invalid_input(format!(
                "cannot shape index data as {}x{}: {}",
                count, dimension, e
            ))
        })?;
        Ok(Self { vectors })
    }

    pub fn kind(&self) -> IndexKind {
        IndexKind::FlatL2
    }

    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major copy of every stored component.
    pub fn to_raw_vec(&self) -> Vec<f32> {
        self.vectors.iter().copied().collect()
    }

    pub fn reconstruct(&self, position: usize) -> Option<Vec<f32>> {
        if position >= self.len() {
            return None;
        }
        Some(self.vectors.row(position).to_vec())
    }

    /// Copies out `count` consecutive vectors starting at `offset`.
    pub fn reconstruct_n(&self, offset: usize, count: usize) -> Result<Vec<Vec<f32>>, DomainError> {
        let end = offset
            .checked_add(count)
            .filter(|end| *end <= self.len())
            .ok_or_else(|| {
                DomainError::invalid_input(format!(
                    "cannot reconstruct {} vectors at offset {} from an index of {}",
                    count,
                    offset,
                    self.len()
                ))
            })?;

        Ok((offset..end)
            .map(|i| self.vectors.row(i).to_vec())
            .collect())
    }

    /// Returns up to `k` `(position, squared L2 distance)` pairs, closest first.
    ///
    /// Rows rejected by `keep` are skipped. Equal distances keep insertion order.
    pub fn search<F>(&self, query: &[f32], k: usize, keep: F) -> Result<Vec<(usize, f32)>, DomainError>
    where
        F: Fn(usize) -> bool,
    {
        if query.len() != self.dimension() {
            return Err(DomainError::dimension_mismatch(self.dimension(), query.len()));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .axis_iter(Axis(0))
            .enumerate()
            .filter(|(position, _)| keep(*position))
            .map(|(position, row)| (position, l2_distance_squared(row, query)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Squared Euclidean distance between two equal-length vectors.
pub fn l2_distance_squared<'a>(a: impl IntoIterator<Item = &'a f32>, b: &[f32]) -> f32 {
    a.into_iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> FlatL2Index {
        FlatL2Index::from_vectors(
            2,
            &[
                vec![0.0, 0.0],
                vec![1.0, 0.0],
                vec![0.0, 2.0],
                vec![-1.0, 0.0],
                vec![3.0, 3.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn search_matches_brute_force_ranking() {
        let index = sample_index();
        let query = [0.9, 0.1];

        let results = index.search(&query, 5, |_| true).unwrap();

        let mut expected: Vec<(usize, f32)> = (0..index.len())
            .map(|i| (i, l2_distance_squared(&index.reconstruct(i).unwrap(), &query)))
            .collect();
        expected.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap().then(a.0.cmp(&b.0)));

        assert_eq!(results, expected);
        assert_eq!(results[0].0, 1);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let index = sample_index();

        // Rows 1 and 3 are both at distance 1 from the origin.
        let results = index.search(&[0.0, 0.0], 3, |_| true).unwrap();

        assert_eq!(results[0], (0, 0.0));
        assert_eq!(results[1], (1, 1.0));
        assert_eq!(results[2], (3, 1.0));
    }

    #[test]
    fn search_respects_k_and_filter() {
        let index = sample_index();

        let results = index.search(&[0.0, 0.0], 2, |position| position % 2 == 0).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 0);
        assert_eq!(results[1].0, 2);
        assert!(index.search(&[0.0, 0.0], 0, |_| true).unwrap().is_empty());
    }

    #[test]
    fn query_dimension_is_checked() {
        let index = sample_index();

        let err = index.search(&[0.0, 0.0, 0.0], 1, |_| true).unwrap_err();

        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn stacking_rejects_wrong_length() {
        let err = FlatL2Index::from_vectors(3, &[vec![1.0, 2.0, 3.0], vec![1.0, 2.0]]).unwrap_err();

        match err {
            DomainError::DimensionMismatch { expected, actual } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reconstruct_by_offset() {
        let index = sample_index();

        assert_eq!(index.reconstruct(2), Some(vec![0.0, 2.0]));
        assert_eq!(index.reconstruct(5), None);
        assert_eq!(
            index.reconstruct_n(3, 2).unwrap(),
            vec![vec![-1.0, 0.0], vec![3.0, 3.0]]
        );
        assert!(index.reconstruct_n(4, 2).is_err());
    }

    #[test]
    fn raw_round_trip_is_bit_exact() {
        let index = sample_index();

        let rebuilt = FlatL2Index::from_raw(2, index.len(), index.to_raw_vec()).unwrap();

        assert_eq!(rebuilt, index);
        assert!(FlatL2Index::from_raw(2, 3, vec![0.0; 5]).is_err());
    }
}
