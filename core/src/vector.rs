use std::error::Error;
use std::fmt;
use wide::{f32x8, f64x4};

/// Error type for vector operations.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorError {
    /// Returned when vectors do not share the same dimension.
    DimensionMismatch { left: usize, right: usize },
    /// Returned when a vector contains NaN or infinity.
    NonFiniteValue { index: usize, value: f32 },
}

impl fmt::Display for VectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch { left, right } => {
                write!(f, "dimension mismatch: left={}, right={}", left, right)
            }
            Self::NonFiniteValue { index, value } => {
                write!(f, "non-finite value at index {index}: {value}")
            }
        }
    }
}

impl Error for VectorError {}

/// Distance returned when cosine similarity is undefined (a zero-norm side).
pub const MAX_UNDEFINED_DISTANCE: f32 = 1.0;

fn validate_lengths(left: &[f32], right: &[f32]) -> Result<(), VectorError> {
    if left.len() != right.len() {
        return Err(VectorError::DimensionMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(())
}

/// Rejects NaN and infinite components.
pub fn validate_finite(values: &[f32]) -> Result<(), VectorError> {
    match values
        .iter()
        .copied()
        .enumerate()
        .find(|(_, value)| !value.is_finite())
    {
        Some((index, value)) => Err(VectorError::NonFiniteValue { index, value }),
        None => Ok(()),
    }
}

/// Computes the dot product between two same-length vectors.
pub fn dot_product(left: &[f32], right: &[f32]) -> Result<f32, VectorError> {
    validate_lengths(left, right)?;
    Ok(simd_dot(left, right))
}

/// Computes cosine similarity. A zero-norm side yields `0.0`.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Result<f32, VectorError> {
    validate_lengths(left, right)?;
    Ok(cosine_similarity_unchecked(left, right).unwrap_or(0.0) as f32)
}

/// Computes cosine distance, `1 - cos(left, right)`, clamped to `[0, 2]`.
///
/// Returns [`MAX_UNDEFINED_DISTANCE`] when either vector is all-zero
/// (including two empty vectors), where the cosine is undefined.
///
/// Both squared norms and the dot product come from one `f64` accumulation
/// pass with the same lane order. Finite `f32` inputs can neither overflow
/// nor underflow there, so `distance(v, v)` is exactly zero for any nonzero
/// finite `v` and the function is exactly symmetric.
pub fn cosine_distance(left: &[f32], right: &[f32]) -> Result<f32, VectorError> {
    validate_lengths(left, right)?;
    let Some(similarity) = cosine_similarity_unchecked(left, right) else {
        return Ok(MAX_UNDEFINED_DISTANCE);
    };
    Ok((1.0 - similarity).clamp(0.0, 2.0) as f32)
}

/// Computes cosine similarity without length validation.
///
/// Returns `None` when one of the squared norms is zero. Callers must ensure
/// both vectors have the same length.
pub fn cosine_similarity_unchecked(left: &[f32], right: &[f32]) -> Option<f64> {
    debug_assert_eq!(left.len(), right.len());

    let (dot, left_sq_sum, right_sq_sum) = simd_dot_and_norms(left, right);
    if left_sq_sum <= 0.0 || right_sq_sum <= 0.0 {
        return None;
    }

    let denominator = (left_sq_sum * right_sq_sum).sqrt();
    Some(dot / denominator)
}

const SIMD_WIDTH: usize = 8;
const WIDE_SIMD_WIDTH: usize = 4;

fn load_f32x8(values: &[f32]) -> f32x8 {
    debug_assert_eq!(values.len(), SIMD_WIDTH);
    f32x8::from([
        values[0], values[1], values[2], values[3], values[4], values[5], values[6], values[7],
    ])
}

fn load_f64x4(values: &[f32]) -> f64x4 {
    debug_assert_eq!(values.len(), WIDE_SIMD_WIDTH);
    f64x4::from([
        f64::from(values[0]),
        f64::from(values[1]),
        f64::from(values[2]),
        f64::from(values[3]),
    ])
}

fn simd_scan(
    left: &[f32],
    right: &[f32],
    mut simd_step: impl FnMut(f32x8, f32x8),
    mut scalar_step: impl FnMut(f32, f32),
) {
    let mut left_chunks = left.chunks_exact(SIMD_WIDTH);
    let mut right_chunks = right.chunks_exact(SIMD_WIDTH);

    for (left_chunk, right_chunk) in left_chunks.by_ref().zip(right_chunks.by_ref()) {
        simd_step(load_f32x8(left_chunk), load_f32x8(right_chunk));
    }

    for (&left_value, &right_value) in left_chunks.remainder().iter().zip(right_chunks.remainder())
    {
        scalar_step(left_value, right_value);
    }
}

fn simd_dot(left: &[f32], right: &[f32]) -> f32 {
    let mut simd_sum = f32x8::ZERO;
    let mut scalar_sum = 0.0;

    simd_scan(
        left,
        right,
        |left_v, right_v| {
            simd_sum += left_v * right_v;
        },
        |left_value, right_value| {
            scalar_sum += left_value * right_value;
        },
    );

    simd_sum.reduce_add() + scalar_sum
}

fn simd_dot_and_norms(left: &[f32], right: &[f32]) -> (f64, f64, f64) {
    let mut dot_sum = f64x4::ZERO;
    let mut left_sq_sum = f64x4::ZERO;
    let mut right_sq_sum = f64x4::ZERO;
    let mut dot_scalar = 0.0f64;
    let mut left_sq_scalar = 0.0f64;
    let mut right_sq_scalar = 0.0f64;

    let mut left_chunks = left.chunks_exact(WIDE_SIMD_WIDTH);
    let mut right_chunks = right.chunks_exact(WIDE_SIMD_WIDTH);
    for (left_chunk, right_chunk) in left_chunks.by_ref().zip(right_chunks.by_ref()) {
        let left_v = load_f64x4(left_chunk);
        let right_v = load_f64x4(right_chunk);
        dot_sum += left_v * right_v;
        left_sq_sum += left_v * left_v;
        right_sq_sum += right_v * right_v;
    }
    for (&left_value, &right_value) in left_chunks.remainder().iter().zip(right_chunks.remainder())
    {
        let (left_value, right_value) = (f64::from(left_value), f64::from(right_value));
        dot_scalar += left_value * right_value;
        left_sq_scalar += left_value * left_value;
        right_sq_scalar += right_value * right_value;
    }

    (
        dot_sum.reduce_add() + dot_scalar,
        left_sq_sum.reduce_add() + left_sq_scalar,
        right_sq_sum.reduce_add() + right_sq_scalar,
    )
}

#[cfg(test)]
mod tests;
