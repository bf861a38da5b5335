use std::fmt::Debug;
use std::sync::Arc;

use crate::error::DygraphError;
use crate::types::DType;

/// Enum for CPU-specific buffer types.
///
/// Buffers are immutable once created; the `Arc` lets detached tensors share
/// storage with the tensor they were detached from.
#[derive(Debug, Clone)]
pub enum CpuBuffer {
    /// Buffer holding f32 data on the CPU.
    F32(Arc<Vec<f32>>),
    /// Buffer holding f64 data on the CPU.
    F64(Arc<Vec<f64>>),
}

impl CpuBuffer {
    /// Wraps `f64` kernel output into a buffer of the requested dtype.
    pub fn from_f64(dtype: DType, data: Vec<f64>) -> Self {
        match dtype {
            DType::F32 => CpuBuffer::F32(Arc::new(data.into_iter().map(|v| v as f32).collect())),
            DType::F64 => CpuBuffer::F64(Arc::new(data)),
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            CpuBuffer::F32(_) => DType::F32,
            CpuBuffer::F64(_) => DType::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CpuBuffer::F32(data) => data.len(),
            CpuBuffer::F64(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the buffer into a `Vec<f64>` for kernel computation.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            CpuBuffer::F32(data) => data.iter().map(|&v| v as f64).collect(),
            CpuBuffer::F64(data) => data.as_ref().clone(),
        }
    }

    /// Attempts to get a reference to the underlying `Arc<Vec<f32>>`.
    pub fn try_get_f32(&self) -> Result<&Arc<Vec<f32>>, DygraphError> {
        match self {
            CpuBuffer::F32(data) => Ok(data),
            other => Err(DygraphError::DataTypeMismatch {
                expected: DType::F32,
                actual: other.dtype(),
                operation: "try_get_f32".to_string(),
            }),
        }
    }

    /// Attempts to get a reference to the underlying `Arc<Vec<f64>>`.
    pub fn try_get_f64(&self) -> Result<&Arc<Vec<f64>>, DygraphError> {
        match self {
            CpuBuffer::F64(data) => Ok(data),
            other => Err(DygraphError::DataTypeMismatch {
                expected: DType::F64,
                actual: other.dtype(),
                operation: "try_get_f64".to_string(),
            }),
        }
    }
}
