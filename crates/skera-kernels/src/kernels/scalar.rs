//! Scalar, hardware-agnostic kernel implementations.
//!
//! This module provides the baseline computation kernels that are guaranteed
//! to work on any architecture. They serve as the reference implementation
//! for correctness.
//!
//! All kernels accumulate in F32 regardless of the storage dtype; the
//! accumulation order is a plain sequential walk over the reduction axis.

use half::{bf16, f16};

/// Scalar indexed dot product for F32 storage.
///
/// `out_chunk[i]` receives `dot(e_rows[i], classes[indices[i]])` where
/// `e_rows` holds the query rows for this chunk back to back and `classes`
/// is the full `[V, D]` class table, row-major.
pub(crate) fn indexed_dot_vec_f32_scalar(
    out_chunk: &mut [f32],
    e_rows: &[f32],
    classes: &[f32],
    indices: &[u32],
    k: usize,
) {
    for (i, (out_val, &class_idx)) in out_chunk.iter_mut().zip(indices.iter()).enumerate() {
        let e_row = &e_rows[i * k..(i + 1) * k];
        let c_start = class_idx as usize * k;
        let c_row = &classes[c_start..c_start + k];
        let sum: f32 = e_row.iter().zip(c_row.iter()).map(|(&x, &y)| x * y).sum();
        *out_val = sum;
    }
}

/// Scalar indexed dot product for F16 storage, accumulated in F32.
pub(crate) fn indexed_dot_vec_f16_scalar(
    out_chunk: &mut [f32],
    e_rows: &[f16],
    classes: &[f16],
    indices: &[u32],
    k: usize,
) {
    for (i, (out_val, &class_idx)) in out_chunk.iter_mut().zip(indices.iter()).enumerate() {
        let e_row = &e_rows[i * k..(i + 1) * k];
        let c_start = class_idx as usize * k;
        let c_row = &classes[c_start..c_start + k];
        let sum: f32 = e_row
            .iter()
            .zip(c_row.iter())
            .map(|(&x, &y)| x.to_f32() * y.to_f32())
            .sum();
        *out_val = sum;
    }
}

/// Scalar indexed dot product for BF16 storage, accumulated in F32.
pub(crate) fn indexed_dot_vec_bf16_scalar(
    out_chunk: &mut [f32],
    e_rows: &[bf16],
    classes: &[bf16],
    indices: &[u32],
    k: usize,
) {
    for (i, (out_val, &class_idx)) in out_chunk.iter_mut().zip(indices.iter()).enumerate() {
        let e_row = &e_rows[i * k..(i + 1) * k];
        let c_start = class_idx as usize * k;
        let c_row = &classes[c_start..c_start + k];
        let sum: f32 = e_row
            .iter()
            .zip(c_row.iter())
            .map(|(&x, &y)| x.to_f32() * y.to_f32())
            .sum();
        *out_val = sum;
    }
}
