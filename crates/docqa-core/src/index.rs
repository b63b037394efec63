//! Exact nearest-neighbour index over unit-normalised vectors.
//!
//! Every vector (stored and query) is scaled to unit length before use, and the
//! distance reported is plain Euclidean distance between those unit vectors. That
//! keeps distances in `[0, 2]` and orders results exactly as cosine similarity
//! would (`d² = 2 - 2·cos`), but the number itself is an L2 distance, not a
//! cosine distance. Use [`cosine_similarity_from_distance`] to convert.

use tracing::{debug, instrument};

/// One search result: the entry's insertion position and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Brute-force index. Vectors live in one flat buffer, row `i` is the `i`-th vector added.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append vectors in order. The whole batch is checked before anything is
    /// stored, so a mismatched vector leaves the index untouched.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        self.check_batch(vectors)?;
        self.data.reserve(vectors.len() * self.dimension);
        for v in vectors {
            self.data.extend(normalized(v));
        }
        Ok(())
    }

    /// Fails with the first mismatching length, if any.
    pub fn check_batch(&self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        match vectors.iter().find(|v| v.len() != self.dimension) {
            Some(bad) => Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            }),
            None => Ok(()),
        }
    }

    /// Up to `k` closest entries, nearest first. Equal distances keep insertion order.
    #[instrument(level = "debug", skip_all, fields(k = k, size = self.len()))]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let q = normalized(query);
        let mut scored: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| Neighbor {
                position,
                distance: l2_distance(&q, row),
            })
            .collect();
        // Stable and total: ties stay in position order, NaN (from non-finite
        // embeddings) goes last whatever its sign bit.
        scored.sort_by(|a, b| {
            a.distance
                .is_nan()
                .cmp(&b.distance.is_nan())
                .then(a.distance.total_cmp(&b.distance))
        });
        scored.truncate(k);
        debug!(returned = scored.len(), "index search done");
        Ok(scored)
    }

    /// Drop every vector. The dimension is kept.
    pub fn reset(&mut self) {
        self.data.clear();
    }
}

/// Scale `v` to unit length. Zero vectors are returned unchanged.
pub fn normalized(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Cosine similarity of two unit vectors given their Euclidean distance.
pub fn cosine_similarity_from_distance(distance: f32) -> f32 {
    1.0 - distance * distance / 2.0
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_first() {
        let mut index = FlatIndex::new(3);
        index
            .add(&[vec![1.0, 0.0, 0.0], vec![0.9, 0.1, 0.0], vec![0.0, 1.0, 0.0]])
            .unwrap();
        assert_eq!(index.len(), 3);

        let hits = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].position, 0);
        assert!(hits[0].distance.abs() < 1e-6);
        assert_eq!(hits[1].position, 1);
        assert!(hits[1].distance > 0.0);
    }

    #[test]
    fn distances_are_scale_invariant_and_bounded() {
        let mut index = FlatIndex::new(2);
        index.add(&[vec![10.0, 0.0], vec![-3.0, 0.0]]).unwrap();
        let hits = index.search(&[0.5, 0.0], 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].distance.abs() < 1e-6);
        assert!((hits[1].distance - 2.0).abs() < 1e-6);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut index = FlatIndex::new(2);
        index
            .add(&[vec![0.0, 1.0], vec![0.0, 2.0], vec![1.0, 0.0], vec![0.0, 5.0]])
            .unwrap();
        let positions: Vec<usize> = index
            .search(&[0.0, 1.0], 4)
            .unwrap()
            .iter()
            .map(|n| n.position)
            .collect();
        assert_eq!(positions, vec![0, 1, 3, 2]);
    }

    #[test]
    fn returns_at_most_len() {
        let mut index = FlatIndex::new(2);
        index.add(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(index.search(&[1.0, 1.0], 5).unwrap().len(), 2);
        assert!(index.search(&[1.0, 1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = FlatIndex::new(4);
        assert!(index.search(&[1.0, 0.0, 0.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn dimension_mismatch_adds_nothing() {
        let mut index = FlatIndex::new(3);
        index.add(&[vec![1.0, 0.0, 0.0]]).unwrap();
        let err = index
            .add(&[vec![0.0, 1.0, 0.0], vec![1.0, 0.0]])
            .unwrap_err();
        assert_eq!(err, IndexError::DimensionMismatch { expected: 3, actual: 2 });
        assert_eq!(index.len(), 1);
        assert!(index.search(&[1.0, 0.0], 1).is_err());
    }

    #[test]
    fn empty_batch_is_noop() {
        let mut index = FlatIndex::new(3);
        index.add(&[]).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn reset_clears_but_keeps_dimension() {
        let mut index = FlatIndex::new(2);
        index.add(&[vec![1.0, 0.0]]).unwrap();
        index.reset();
        assert_eq!(index.len(), 0);
        assert_eq!(index.dimension(), 2);
        index.reset();
        assert!(index.is_empty());
    }

    #[test]
    fn non_finite_vectors_sort_last() {
        let mut index = FlatIndex::new(2);
        let rows: Vec<Vec<f32>> = (0..64)
            .map(|i| match i % 3 {
                0 => vec![f32::NAN, 1.0],
                1 => vec![f32::INFINITY, f32::INFINITY],
                _ => vec![1.0, i as f32 / 64.0],
            })
            .collect();
        index.add(&rows).unwrap();

        let hits = index.search(&[1.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 10);
        assert_eq!(hits[0].position, 2);
        assert!(hits.iter().all(|n| n.distance.is_finite()));
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

        let all = index.search(&[1.0, 0.0], 64).unwrap();
        let first_nan = all.iter().position(|n| n.distance.is_nan()).unwrap();
        assert!(all[first_nan..].iter().all(|n| n.distance.is_nan()));
    }

    #[test]
    fn cosine_conversion() {
        assert!((cosine_similarity_from_distance(0.0) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity_from_distance(2.0) + 1.0).abs() < 1e-6);
        let d = std::f32::consts::SQRT_2;
        assert!(cosine_similarity_from_distance(d).abs() < 1e-6);
    }
}
