//! Elementwise nonlinearities shared by the kernels and their reference
//! pipelines.

use libm::tanhf;
use rayon::prelude::*;

/// Minimum slice size for parallel execution.
pub const PARALLEL_THRESHOLD: usize = 16_384;

/// Saturating soft cap: `cap * tanh(x / cap)`.
///
/// Near-identity for `|x| << cap`, bounded by `(-cap, cap)` everywhere.
#[inline(always)]
pub fn softcapping_scalar(x: f32, cap: f32) -> f32 {
    cap * tanhf(x / cap)
}

/// Applies the soft cap in place.
pub fn apply_softcapping(values: &mut [f32], cap: f32) {
    if values.len() >= PARALLEL_THRESHOLD {
        values
            .par_iter_mut()
            .for_each(|x| *x = softcapping_scalar(*x, cap));
    } else {
        values
            .iter_mut()
            .for_each(|x| *x = softcapping_scalar(*x, cap));
    }
}
