//! Exact brute-force index.

use crate::ann::traits::{AnnIndex, IndexFactory};
use crate::distance::{l2_distance_squared, matrix_len, row};
use crate::{PyramidError, Result};

/// Exhaustive squared-L2 scan.
///
/// Exact, so useful for tiny partitions and as a ground-truth oracle in tests.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<f32>,
    num_vectors: usize,
    built: bool,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(PyramidError::InvalidParameter(
                "dimension must be greater than 0".into(),
            ));
        }
        Ok(Self {
            dimension,
            vectors: Vec::new(),
            num_vectors: 0,
            built: false,
        })
    }
}

impl AnnIndex for FlatIndex {
    fn build(&mut self, vectors: &[f32], count: usize) -> Result<()> {
        if self.built {
            return Err(PyramidError::AlreadyBuilt);
        }
        let expected = matrix_len(count, self.dimension)?;
        if vectors.len() != expected {
            return Err(PyramidError::DimensionMismatch {
                expected,
                actual: vectors.len(),
            });
        }
        self.vectors = vectors.to_vec();
        self.num_vectors = count;
        self.built = true;
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(u32, f32)>> {
        if !self.built {
            return Err(PyramidError::EmptyIndex);
        }
        if query.len() != self.dimension {
            return Err(PyramidError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        let mut scored: Vec<(u32, f32)> = (0..self.num_vectors)
            .map(|i| {
                let v = row(&self.vectors, self.dimension, i);
                (i as u32, l2_distance_squared(query, v))
            })
            .collect();
        scored.sort_unstable_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.num_vectors
    }

    fn algorithm(&self) -> &'static str {
        "Flat"
    }
}

/// Factory for [`FlatIndex`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatFactory;

impl IndexFactory for FlatFactory {
    fn create(&self, dimension: usize) -> Result<Box<dyn AnnIndex>> {
        Ok(Box::new(FlatIndex::new(dimension)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_exact_neighbors_in_order() {
        let mut index = FlatIndex::new(2).unwrap();
        let data = [0.0, 0.0, 5.0, 5.0, 1.0, 0.0, 0.0, 2.0];
        index.build(&data, 4).unwrap();

        let results = index.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(results, vec![(0, 0.0), (2, 1.0), (3, 4.0)]);
    }

    #[test]
    fn k_larger_than_len_returns_everything() {
        let mut index = FlatIndex::new(1).unwrap();
        index.build(&[1.0, 2.0], 2).unwrap();
        assert_eq!(index.search(&[0.0], 10).unwrap().len(), 2);
    }

    #[test]
    fn ties_break_by_id() {
        let mut index = FlatIndex::new(1).unwrap();
        index.build(&[1.0, -1.0, 1.0], 3).unwrap();
        let ids: Vec<u32> = index
            .search(&[0.0], 3)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn second_build_is_rejected() {
        let mut index = FlatIndex::new(1).unwrap();
        index.build(&[1.0], 1).unwrap();
        assert_eq!(index.build(&[2.0], 1), Err(PyramidError::AlreadyBuilt));
    }

    #[test]
    fn overflowing_count_is_rejected() {
        let mut index = FlatIndex::new(4).unwrap();
        assert!(matches!(
            index.build(&[0.0; 4], usize::MAX / 2),
            Err(PyramidError::InvalidParameter(_))
        ));
        index.build(&[0.0; 4], 1).unwrap();
    }

    #[test]
    fn search_before_build_fails() {
        let index = FlatIndex::new(3).unwrap();
        assert_eq!(
            index.search(&[0.0; 3], 1),
            Err(PyramidError::EmptyIndex)
        );
    }
}
