//! Dense weight-vector kernels.

use wide::f64x4;

const LANES: usize = 4;

/// Multiply every element by `factor`, four lanes at a time.
pub fn scale_in_place(values: &mut [f64], factor: f64) {
    let factor_lanes = f64x4::splat(factor);
    let mut chunks = values.chunks_exact_mut(LANES);
    for chunk in &mut chunks {
        let scaled = f64x4::new([chunk[0], chunk[1], chunk[2], chunk[3]]) * factor_lanes;
        chunk.copy_from_slice(&scaled.to_array());
    }
    for value in chunks.into_remainder() {
        *value *= factor;
    }
}

/// Sum of squares.
#[must_use]
pub fn squared_norm(values: &[f64]) -> f64 {
    let mut acc = f64x4::splat(0.0);
    let chunks = values.chunks_exact(LANES);
    let tail: f64 = chunks.remainder().iter().map(|v| v * v).sum();
    for chunk in chunks {
        let lanes = f64x4::new([chunk[0], chunk[1], chunk[2], chunk[3]]);
        acc += lanes * lanes;
    }
    acc.reduce_add() + tail
}
