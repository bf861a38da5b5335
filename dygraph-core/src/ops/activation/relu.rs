use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::arithmetic::mul_op;
use crate::ops::utils::unary_map;
use crate::tensor::Tensor;

/// Multiplies the output gradient by a constant per-element slope.
#[derive(Debug)]
struct MaskBackward {
    mask: Tensor,
}

impl BackwardOp for MaskBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        Ok(vec![mul_op(&grad_outputs[0], &self.mask)?.into()])
    }
}

fn slope_mask(input: &Tensor, negative_slope: f64) -> Result<Tensor, DygraphError> {
    unary_map(input, |x| if x > 0.0 { 1.0 } else { negative_slope })
}

/// Rectified Linear Unit: `max(x, 0)`.
pub fn relu_op(input: &Tensor) -> Result<Tensor, DygraphError> {
    let output = unary_map(input, |x| if x > 0.0 { x } else { 0.0 })?;
    if needs_record(&[input]) {
        let mask = slope_mask(input, 0.0)?;
        record_operation("relu", &[input], &[&output], MaskBackward { mask });
    }
    Ok(output)
}

/// `x` for positive `x`, `alpha * x` otherwise.
pub fn leaky_relu_op(input: &Tensor, alpha: f64) -> Result<Tensor, DygraphError> {
    let output = unary_map(input, |x| if x > 0.0 { x } else { alpha * x })?;
    if needs_record(&[input]) {
        let mask = slope_mask(input, alpha)?;
        record_operation("leaky_relu", &[input], &[&output], MaskBackward { mask });
    }
    Ok(output)
}

#[cfg(test)]
#[path = "relu_test.rs"]
mod tests;
