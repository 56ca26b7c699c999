//! Float-vector arithmetic: norms, normalization, and distance metrics.
//!
//! A stateless numerical library — no allocation beyond the caller-owned
//! slices, no early termination, exact arithmetic modulo float rounding.
//! The equality tolerance used throughout this crate's tests is `1e-6`.

use crate::error::VectorError;

/// Equality tolerance used for float comparisons in this crate.
pub const EPSILON: f64 = 1e-6;

/// Maximum allowed vector dimensionality (§5 resource bounds).
pub const MAX_DIMENSIONS: usize = 4096;

fn check_finite(v: &[f32]) -> Result<(), VectorError> {
    for (index, x) in v.iter().enumerate() {
        if !x.is_finite() {
            return Err(VectorError::NonFinite { index });
        }
    }
    Ok(())
}

fn check_dims(a: &[f32], b: &[f32]) -> Result<(), VectorError> {
    if a.len() != b.len() {
        return Err(VectorError::DimensionMismatch { a: a.len(), b: b.len() });
    }
    Ok(())
}

/// Validate that a vector's dimensionality is within `[1, 4096]` and every
/// scalar is finite. Called at insert time per §4.H failure modes.
///
/// # Errors
///
/// Returns [`VectorError::DimensionsOutOfBounds`] or
/// [`VectorError::NonFinite`].
pub fn validate(v: &[f32]) -> Result<(), VectorError> {
    if v.is_empty() || v.len() > MAX_DIMENSIONS {
        return Err(VectorError::DimensionsOutOfBounds(v.len()));
    }
    check_finite(v)
}

/// Euclidean (L2) norm.
#[must_use]
pub fn norm(v: &[f32]) -> f64 {
    v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt()
}

/// Return `v` scaled to unit length.
///
/// # Errors
///
/// Returns [`VectorError::ZeroVector`] if `norm(v) == 0`.
pub fn normalize(v: &[f32]) -> Result<Vec<f32>, VectorError> {
    let n = norm(v);
    if n == 0.0 {
        return Err(VectorError::ZeroVector);
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(v.iter().map(|x| (f64::from(*x) / n) as f32).collect())
}

/// Dot product.
///
/// # Errors
///
/// Returns [`VectorError::DimensionMismatch`] if `a.len() != b.len()`.
pub fn dot(a: &[f32], b: &[f32]) -> Result<f64, VectorError> {
    check_dims(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum())
}

/// Cosine similarity, in `[-1, 1]`.
///
/// Cosine similarity between two zero vectors is defined as `0`, not `NaN`,
/// per the design's explicit edge-case rule.
///
/// # Errors
///
/// Returns [`VectorError::DimensionMismatch`] if dimensions differ.
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f64, VectorError> {
    check_dims(a, b)?;
    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return Ok(0.0);
    }
    Ok(dot(a, b)? / (na * nb))
}

/// Cosine distance: `1 - cosine(a, b)`.
///
/// # Errors
///
/// Returns [`VectorError::DimensionMismatch`] if dimensions differ.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f64, VectorError> {
    Ok(1.0 - cosine(a, b)?)
}

/// Squared Euclidean distance (cheaper than `euclidean` when only ordering
/// matters).
///
/// # Errors
///
/// Returns [`VectorError::DimensionMismatch`] if dimensions differ.
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> Result<f64, VectorError> {
    check_dims(a, b)?;
    Ok(a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum())
}

/// Euclidean (L2) distance.
///
/// # Errors
///
/// Returns [`VectorError::DimensionMismatch`] if dimensions differ.
pub fn euclidean(a: &[f32], b: &[f32]) -> Result<f64, VectorError> {
    Ok(squared_euclidean(a, b)?.sqrt())
}

/// Manhattan (L1) distance.
///
/// # Errors
///
/// Returns [`VectorError::DimensionMismatch`] if dimensions differ.
pub fn manhattan(a: &[f32], b: &[f32]) -> Result<f64, VectorError> {
    check_dims(a, b)?;
    Ok(a.iter()
        .zip(b)
        .map(|(x, y)| (f64::from(*x) - f64::from(*y)).abs())
        .sum())
}

/// `true` if `a` and `b` are equal within [`EPSILON`], componentwise.
#[must_use]
pub fn approx_eq(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| (f64::from(*x) - f64::from(*y)).abs() <= EPSILON)
}
