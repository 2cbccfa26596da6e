//! Distance and normalization primitives for dense vectors.
//!
//! Every index in this crate ranks by [`l2_distance_squared`]. The square root is
//! never taken: it is monotonic, so rankings are identical and the hot loop stays
//! multiply-add only.
//!
//! [`angular_distance`] is provided for callers that pre-normalize their data and
//! want to report cosine-style scores. On unit vectors it is a monotonic function of
//! squared L2 (`|a - b|^2 = 2 - 2cos`), which is why [`normalize_dataset`] is enough
//! to run an angular workload through the L2 indexes.

use crate::{PyramidError, Result};

const NORM_EPSILON: f32 = 1e-10;

/// Dot product of two vectors.
#[inline]
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2 norm of a vector.
#[inline]
#[must_use]
pub fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Squared Euclidean distance.
///
/// If dimensions mismatch, this returns `f32::INFINITY` (so it is never selected as a
/// nearest neighbor).
#[inline]
#[must_use]
pub fn l2_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Angular distance `1 - cos(a, b)`, in `[0, 2]`.
///
/// A zero vector has no direction; it is treated as maximally unrelated and the
/// distance is `1.0`.
#[inline]
#[must_use]
pub fn angular_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    let mut ab = 0.0f32;
    let mut aa = 0.0f32;
    let mut bb = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        ab += x * y;
        aa += x * x;
        bb += y * y;
    }
    if aa == 0.0 || bb == 0.0 {
        return 1.0;
    }
    let cosine = (ab / (aa.sqrt() * bb.sqrt())).clamp(-1.0, 1.0);
    1.0 - cosine
}

/// Normalize a vector to unit L2 norm.
#[inline]
#[must_use]
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let mut out = v.to_vec();
    normalize_in_place(&mut out);
    out
}

/// Normalize a vector to unit L2 norm in place. Zero vectors are left untouched.
#[inline]
pub fn normalize_in_place(v: &mut [f32]) {
    let n = norm(v);
    if n > NORM_EPSILON {
        for x in v.iter_mut() {
            *x /= n;
        }
    }
}

/// Normalize every row of a row-major `[n * dim]` dataset in place.
///
/// A trailing partial row (when `data.len()` is not a multiple of `dim`) is ignored.
pub fn normalize_dataset(data: &mut [f32], dim: usize) {
    if dim == 0 {
        return;
    }
    for row in data.chunks_exact_mut(dim) {
        normalize_in_place(row);
    }
}

/// Length of a row-major `[rows * dim]` matrix, or an error if it overflows.
pub(crate) fn matrix_len(rows: usize, dim: usize) -> Result<usize> {
    rows.checked_mul(dim).ok_or_else(|| {
        PyramidError::InvalidParameter(format!(
            "{rows} vectors of dimension {dim} overflow the address space"
        ))
    })
}

/// Borrow row `idx` of a row-major matrix.
#[inline]
pub(crate) fn row(data: &[f32], dim: usize, idx: usize) -> &[f32] {
    let start = idx * dim;
    &data[start..start + dim]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_squared_matches_hand_computation() {
        let a = [0.0_f32, 0.0];
        let b = [3.0_f32, 4.0];
        assert_eq!(l2_distance_squared(&a, &b), 25.0);
        assert_eq!(l2_distance_squared(&b, &a), 25.0);
    }

    #[test]
    fn l2_squared_mismatched_lengths_is_infinite() {
        assert_eq!(l2_distance_squared(&[1.0], &[1.0, 2.0]), f32::INFINITY);
    }

    #[test]
    fn angular_distance_is_zero_for_parallel() {
        let a = [1.0_f32, 2.0, 3.0];
        let b = [2.0_f32, 4.0, 6.0];
        assert!(angular_distance(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn angular_distance_orthogonal_and_opposite() {
        assert!((angular_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((angular_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn angular_distance_zero_vector() {
        assert_eq!(angular_distance(&[0.0, 0.0], &[1.0, 1.0]), 1.0);
    }

    #[test]
    fn normalize_produces_unit_vector() {
        let v = normalize(&[3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((norm(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector() {
        assert_eq!(normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn normalize_dataset_rows_independently() {
        let mut data = vec![3.0, 4.0, 0.0, 2.0, 0.0, 0.0];
        normalize_dataset(&mut data, 2);
        assert!((data[0] - 0.6).abs() < 1e-6);
        assert!((data[3] - 1.0).abs() < 1e-6);
        assert_eq!(&data[4..], &[0.0, 0.0]);
    }

    #[test]
    fn unit_vectors_rank_the_same_under_both_metrics() {
        let q = normalize(&[1.0, 0.2]);
        let near = normalize(&[1.0, 0.3]);
        let far = normalize(&[0.1, 1.0]);
        assert!(l2_distance_squared(&q, &near) < l2_distance_squared(&q, &far));
        assert!(angular_distance(&q, &near) < angular_distance(&q, &far));
    }

    #[test]
    fn matrix_len_reports_overflow() {
        assert_eq!(matrix_len(3, 4), Ok(12));
        assert!(matches!(
            matrix_len(usize::MAX / 2, 4),
            Err(PyramidError::InvalidParameter(_))
        ));
    }
}
