//! Fused indexed negative dot product.
//!
//! This is the target-logit kernel of a cut cross-entropy loss. Instead of
//! computing the full `[N, V]` logits matrix `E @ C.T` and gathering one
//! logit per row, it contracts each query row directly against the single
//! class row its index selects:
//!
//! ```text
//! out[n] = -dot(E[n], C[indices[n]]) - bias[indices[n]]
//! ```
//!
//! optionally followed by a saturating soft cap. The selected class rows are
//! read in place; no `[N, D]` gather tensor and no `[N, V]` logits tensor is
//! ever allocated.
//!
//! Every dot product is accumulated in F32 regardless of the storage dtype,
//! the bias subtraction and soft cap run on the F32 values, and the single
//! narrowing cast back to the storage dtype happens last.

use crate::activations::apply_softcapping;
use crate::kernels;
use crate::tensor::{DType, MatrixData, VectorData};
use anyhow::{anyhow, Result};
use half::{bf16, f16};
use ndarray::Array1;
use rayon::prelude::*;

/// Optional fused terms for [`indexed_neg_dot`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexedDotOpts<'a> {
    /// Per-class bias, length `V`, subtracted from the negated dot product.
    pub bias: Option<&'a VectorData>,
    /// Positive cap for the saturating `cap * tanh(x / cap)` transform.
    pub softcap: Option<f32>,
}

impl<'a> IndexedDotOpts<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fuse a per-class bias into the result.
    pub fn with_bias(mut self, bias: &'a VectorData) -> Self {
        self.bias = Some(bias);
        self
    }

    /// Soft-cap the result (Gemma2-style logit capping).
    pub fn with_softcap(mut self, softcap: f32) -> Self {
        self.softcap = Some(softcap);
        self
    }
}

/// Computes the negated, optionally bias-adjusted and soft-capped dot
/// product between each query row and the class row its index selects.
///
/// # Arguments
///
/// * `queries` - Query matrix `[N, D]`
/// * `classes` - Class embedding table `[V, D]`, same dtype family as
///   `queries`
/// * `indices` - One class index per query row, each in `[0, V)`
/// * `opts` - Optional fused bias and soft cap
///
/// # Returns
///
/// A length-`N` vector in the storage dtype of `queries`.
///
/// # Errors
///
/// Fails fast, with no partial results, on dimension mismatches, indices
/// outside `[0, V)`, mixed dtype families, or a non-positive/non-finite
/// soft cap.
pub fn indexed_neg_dot(
    queries: &MatrixData,
    classes: &MatrixData,
    indices: &[u32],
    opts: &IndexedDotOpts,
) -> Result<VectorData> {
    let (n, d) = queries.dim();
    let (v, d2) = classes.dim();

    if d2 != d {
        return Err(anyhow!(
            "query/class dimension mismatch: queries [{}, {}] vs classes [{}, {}]",
            n,
            d,
            v,
            d2
        ));
    }
    if indices.len() != n {
        return Err(anyhow!(
            "indices length {} != number of query rows {}",
            indices.len(),
            n
        ));
    }
    if queries.dtype() != classes.dtype() {
        return Err(anyhow!(
            "queries and classes must share a dtype family: {:?} vs {:?}",
            queries.dtype(),
            classes.dtype()
        ));
    }
    if let Some(bias) = opts.bias {
        if bias.dtype() != queries.dtype() {
            return Err(anyhow!(
                "bias dtype {:?} does not match query dtype {:?}",
                bias.dtype(),
                queries.dtype()
            ));
        }
        if bias.len() != v {
            return Err(anyhow!(
                "bias length {} != number of classes {}",
                bias.len(),
                v
            ));
        }
    }
    if let Some(cap) = opts.softcap {
        if !cap.is_finite() || cap <= 0.0 {
            return Err(anyhow!("softcap must be a finite positive value, got {cap}"));
        }
    }
    if let Some(pos) = indices.iter().position(|&ix| ix as usize >= v) {
        return Err(anyhow!(
            "class index {} at row {} is out of range for {} classes",
            indices[pos],
            pos,
            v
        ));
    }

    log::debug!(
        "indexed_neg_dot: n={} v={} d={} dtype={:?} bias={} softcap={:?}",
        n,
        v,
        d,
        queries.dtype(),
        opts.bias.is_some(),
        opts.softcap
    );

    // Raw dot products in F32, one per query row.
    let mut raw = match (queries, classes) {
        (MatrixData::F32(e), MatrixData::F32(c)) => {
            let e_s = e.as_standard_layout();
            let c_s = c.as_standard_layout();
            indexed_dot_rows_f32(
                e_s.as_slice().expect("query tensor must be contiguous"),
                c_s.as_slice().expect("class tensor must be contiguous"),
                indices,
                d,
            )
        }
        (MatrixData::F16(e), MatrixData::F16(c)) => {
            let e_s = e.as_standard_layout();
            let c_s = c.as_standard_layout();
            indexed_dot_rows_f16(
                e_s.as_slice().expect("query tensor must be contiguous"),
                c_s.as_slice().expect("class tensor must be contiguous"),
                indices,
                d,
            )
        }
        (MatrixData::BF16(e), MatrixData::BF16(c)) => {
            let e_s = e.as_standard_layout();
            let c_s = c.as_standard_layout();
            indexed_dot_rows_bf16(
                e_s.as_slice().expect("query tensor must be contiguous"),
                c_s.as_slice().expect("class tensor must be contiguous"),
                indices,
                d,
            )
        }
        _ => {
            return Err(anyhow!(
                "indexed dot not supported for dtype pair {:?}/{:?}",
                queries.dtype(),
                classes.dtype()
            ));
        }
    };

    // Negate and subtract the gathered bias while still in F32.
    match opts.bias {
        Some(VectorData::F32(b)) => {
            for (r, &ix) in raw.iter_mut().zip(indices.iter()) {
                *r = -*r - b[ix as usize];
            }
        }
        Some(VectorData::F16(b)) => {
            for (r, &ix) in raw.iter_mut().zip(indices.iter()) {
                *r = -*r - b[ix as usize].to_f32();
            }
        }
        Some(VectorData::BF16(b)) => {
            for (r, &ix) in raw.iter_mut().zip(indices.iter()) {
                *r = -*r - b[ix as usize].to_f32();
            }
        }
        None => raw.iter_mut().for_each(|r| *r = -*r),
    }

    if let Some(cap) = opts.softcap {
        apply_softcapping(&mut raw, cap);
    }

    // The single narrowing cast, after all F32 arithmetic.
    Ok(match queries.dtype() {
        DType::F32 => VectorData::F32(Array1::from(raw)),
        DType::F16 => VectorData::F16(Array1::from_iter(raw.iter().map(|&x| f16::from_f32(x)))),
        DType::BF16 => VectorData::BF16(Array1::from_iter(raw.iter().map(|&x| bf16::from_f32(x)))),
    })
}

fn indexed_dot_rows_f32(e: &[f32], c: &[f32], indices: &[u32], k: usize) -> Vec<f32> {
    let n = indices.len();
    let mut out = vec![0.0f32; n];
    if n == 0 {
        return out;
    }

    let num_threads = rayon::current_num_threads();
    let chunk_size = (n + num_threads - 1) / num_threads;

    out.par_chunks_mut(chunk_size)
        .enumerate()
        .for_each(|(chunk_idx, out_chunk)| {
            let start = chunk_idx * chunk_size;
            let idx_chunk = &indices[start..start + out_chunk.len()];
            let e_rows = &e[start * k..(start + out_chunk.len()) * k];

            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
                unsafe {
                    kernels::x86::f32::indexed_dot_vec_f32(
                        out_chunk,
                        e_rows.as_ptr(),
                        c.as_ptr(),
                        idx_chunk,
                        k,
                    );
                }
                return;
            }

            kernels::scalar::indexed_dot_vec_f32_scalar(out_chunk, e_rows, c, idx_chunk, k);
        });

    out
}

fn indexed_dot_rows_f16(e: &[f16], c: &[f16], indices: &[u32], k: usize) -> Vec<f32> {
    let n = indices.len();
    let mut out = vec![0.0f32; n];
    if n == 0 {
        return out;
    }

    let num_threads = rayon::current_num_threads();
    let chunk_size = (n + num_threads - 1) / num_threads;

    out.par_chunks_mut(chunk_size)
        .enumerate()
        .for_each(|(chunk_idx, out_chunk)| {
            let start = chunk_idx * chunk_size;
            let idx_chunk = &indices[start..start + out_chunk.len()];
            let e_rows = &e[start * k..(start + out_chunk.len()) * k];

            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            if is_x86_feature_detected!("avx2")
                && is_x86_feature_detected!("fma")
                && is_x86_feature_detected!("f16c")
            {
                unsafe {
                    kernels::x86::f16::indexed_dot_vec_f16(
                        out_chunk,
                        e_rows.as_ptr() as *const u16,
                        c.as_ptr() as *const u16,
                        idx_chunk,
                        k,
                    );
                }
                return;
            }

            kernels::scalar::indexed_dot_vec_f16_scalar(out_chunk, e_rows, c, idx_chunk, k);
        });

    out
}

fn indexed_dot_rows_bf16(e: &[bf16], c: &[bf16], indices: &[u32], k: usize) -> Vec<f32> {
    let n = indices.len();
    let mut out = vec![0.0f32; n];
    if n == 0 {
        return out;
    }

    let num_threads = rayon::current_num_threads();
    let chunk_size = (n + num_threads - 1) / num_threads;

    out.par_chunks_mut(chunk_size)
        .enumerate()
        .for_each(|(chunk_idx, out_chunk)| {
            let start = chunk_idx * chunk_size;
            let idx_chunk = &indices[start..start + out_chunk.len()];
            let e_rows = &e[start * k..(start + out_chunk.len()) * k];

            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
                unsafe {
                    kernels::x86::bf16::indexed_dot_vec_bf16(
                        out_chunk,
                        e_rows.as_ptr() as *const u16,
                        c.as_ptr() as *const u16,
                        idx_chunk,
                        k,
                    );
                }
                return;
            }

            kernels::scalar::indexed_dot_vec_bf16_scalar(out_chunk, e_rows, c, idx_chunk, k);
        });

    out
}
