//! Fused indexed dot-product kernels for memory-efficient cross-entropy.
//!
//! The centerpiece is [`indexed_neg_dot`]: given a query matrix `[N, D]`, a
//! class-embedding table `[V, D]` and a per-row class index, it produces the
//! negated target logits `-dot(E[n], C[idx[n]])` with optional fused bias and
//! soft-capping, without ever materializing the `[N, V]` logits matrix or an
//! `[N, D]` gather of the selected class rows.

pub mod activations;
pub mod ops;
pub mod tensor;

pub(crate) mod kernels;

// Re-export commonly used items
pub use crate::{
    activations::{apply_softcapping, softcapping_scalar},
    ops::indexed_dot::{indexed_neg_dot, IndexedDotOpts},
    tensor::{DType, MatrixData, VectorData},
};
