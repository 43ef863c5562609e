//! Tagged tensor storage for the supported floating-point families.
//!
//! Matrices and vectors are held in their native storage dtype, so a BF16
//! class table stays 2 bytes per element in memory. The enums allow the
//! `ops` dispatchers to select a type-safe kernel without upcasting whole
//! tensors first.

mod dtype;

pub use dtype::DType;

use half::{bf16, f16};
use ndarray::{Array1, Array2};

/// A dense 2-D tensor in its native storage dtype.
#[derive(Debug, Clone)]
pub enum MatrixData {
    F32(Array2<f32>),
    F16(Array2<f16>),
    BF16(Array2<bf16>),
}

impl MatrixData {
    pub fn dtype(&self) -> DType {
        match self {
            MatrixData::F32(_) => DType::F32,
            MatrixData::F16(_) => DType::F16,
            MatrixData::BF16(_) => DType::BF16,
        }
    }

    /// Returns `(rows, cols)`.
    pub fn dim(&self) -> (usize, usize) {
        match self {
            MatrixData::F32(a) => a.dim(),
            MatrixData::F16(a) => a.dim(),
            MatrixData::BF16(a) => a.dim(),
        }
    }
}

impl From<Array2<f32>> for MatrixData {
    fn from(a: Array2<f32>) -> Self {
        MatrixData::F32(a)
    }
}

impl From<Array2<f16>> for MatrixData {
    fn from(a: Array2<f16>) -> Self {
        MatrixData::F16(a)
    }
}

impl From<Array2<bf16>> for MatrixData {
    fn from(a: Array2<bf16>) -> Self {
        MatrixData::BF16(a)
    }
}

/// A dense 1-D tensor in its native storage dtype.
#[derive(Debug, Clone)]
pub enum VectorData {
    F32(Array1<f32>),
    F16(Array1<f16>),
    BF16(Array1<bf16>),
}

impl VectorData {
    pub fn dtype(&self) -> DType {
        match self {
            VectorData::F32(_) => DType::F32,
            VectorData::F16(_) => DType::F16,
            VectorData::BF16(_) => DType::BF16,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            VectorData::F32(a) => a.len(),
            VectorData::F16(a) => a.len(),
            VectorData::BF16(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widens to an F32 array, exact for every supported storage dtype.
    pub fn to_f32(&self) -> Array1<f32> {
        match self {
            VectorData::F32(a) => a.clone(),
            VectorData::F16(a) => a.mapv(|x| x.to_f32()),
            VectorData::BF16(a) => a.mapv(|x| x.to_f32()),
        }
    }
}

impl From<Array1<f32>> for VectorData {
    fn from(a: Array1<f32>) -> Self {
        VectorData::F32(a)
    }
}

impl From<Array1<f16>> for VectorData {
    fn from(a: Array1<f16>) -> Self {
        VectorData::F16(a)
    }
}

impl From<Array1<bf16>> for VectorData {
    fn from(a: Array1<bf16>) -> Self {
        VectorData::BF16(a)
    }
}
