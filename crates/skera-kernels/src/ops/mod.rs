//! Public, safe entry points for the fused kernels.

pub mod indexed_dot;
