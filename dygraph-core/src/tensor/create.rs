// src/tensor/create.rs

use crate::buffer::CpuBuffer;
use crate::error::DygraphError;
use crate::tensor::Tensor;
use crate::types::DType;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// Creates a new leaf tensor filled with zeros with the specified shape and dtype.
pub fn zeros(shape: &[usize], dtype: DType) -> Result<Tensor, DygraphError> {
    full(shape, 0.0, dtype)
}

/// Creates a new leaf tensor filled with ones with the specified shape and dtype.
pub fn ones(shape: &[usize], dtype: DType) -> Result<Tensor, DygraphError> {
    full(shape, 1.0, dtype)
}

/// Creates a new leaf tensor filled with `value`.
pub fn full(shape: &[usize], value: f64, dtype: DType) -> Result<Tensor, DygraphError> {
    let numel: usize = shape.iter().product();
    Tensor::from_buffer(CpuBuffer::from_f64(dtype, vec![value; numel]), shape.to_vec())
}

/// Zeros with the shape and dtype of `tensor`.
pub fn zeros_like(tensor: &Tensor) -> Result<Tensor, DygraphError> {
    zeros(&tensor.shape(), tensor.dtype())
}

/// Ones with the shape and dtype of `tensor`.
pub fn ones_like(tensor: &Tensor) -> Result<Tensor, DygraphError> {
    ones(&tensor.shape(), tensor.dtype())
}

pub fn full_like(tensor: &Tensor, value: f64) -> Result<Tensor, DygraphError> {
    full(&tensor.shape(), value, tensor.dtype())
}

/// Creates a leaf tensor with elements drawn uniformly from `[low, high)`.
pub fn uniform<R: Rng + ?Sized>(
    shape: &[usize],
    low: f64,
    high: f64,
    dtype: DType,
    rng: &mut R,
) -> Result<Tensor, DygraphError> {
    if !low.is_finite() || !high.is_finite() || low >= high {
        return Err(DygraphError::InvalidArgument(format!(
            "uniform requires a finite range with low < high, got [{}, {})",
            low, high
        )));
    }
    let numel: usize = shape.iter().product();
    let dist = Uniform::new(low, high);
    let data: Vec<f64> = (0..numel).map(|_| dist.sample(rng)).collect();
    Tensor::from_buffer(CpuBuffer::from_f64(dtype, data), shape.to_vec())
}

#[cfg(test)]
#[path = "create_test.rs"]
mod tests;
