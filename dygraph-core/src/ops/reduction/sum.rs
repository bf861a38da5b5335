use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::utils::Operand;
use crate::ops::view::expand_op;
use crate::tensor::broadcast_utils::{can_broadcast_to, BroadcastIndexer};
use crate::tensor::utils::index_to_coord;
use crate::tensor::Tensor;

/// Backward of both reductions: broadcast the gradient back to the input shape.
#[derive(Debug)]
struct ExpandGradBackward {
    input_shape: Vec<usize>,
}

impl BackwardOp for ExpandGradBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        Ok(vec![expand_op(&grad_outputs[0], &self.input_shape)?.into()])
    }
}

/// Sum of all elements, as a 0-dimensional tensor.
pub fn sum_op(input: &Tensor) -> Result<Tensor, DygraphError> {
    let x = Operand::read(input);
    let total: f64 = x.data.iter().sum();
    let output = Tensor::from_f64_as(x.dtype, vec![total], Vec::new())?;
    if needs_record(&[input]) {
        record_operation(
            "sum",
            &[input],
            &[&output],
            ExpandGradBackward { input_shape: x.shape },
        );
    }
    Ok(output)
}

/// Sums `input` down to `target_shape`, the inverse of broadcasting
/// `target_shape` to the input's shape.
///
/// # Errors
/// `BroadcastError` if `target_shape` does not broadcast to the input's shape.
pub fn sum_to_op(input: &Tensor, target_shape: &[usize]) -> Result<Tensor, DygraphError> {
    let x = Operand::read(input);
    if !can_broadcast_to(target_shape, &x.shape) {
        return Err(DygraphError::BroadcastError {
            shape1: x.shape,
            shape2: target_shape.to_vec(),
        });
    }
    let numel: usize = target_shape.iter().product();
    let indexer = BroadcastIndexer::new(target_shape, x.shape.len());
    let mut data = vec![0.0; numel];
    for (i, value) in x.data.iter().enumerate() {
        let coord = index_to_coord(i, &x.shape);
        data[indexer.index(&coord)] += value;
    }
    let output = Tensor::from_f64_as(x.dtype, data, target_shape.to_vec())?;
    if needs_record(&[input]) {
        record_operation(
            "sum_to",
            &[input],
            &[&output],
            ExpandGradBackward { input_shape: x.shape },
        );
    }
    Ok(output)
}

#[cfg(test)]
#[path = "sum_test.rs"]
mod tests;
