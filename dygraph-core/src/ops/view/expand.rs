use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::reduction::sum_to_op;
use crate::ops::utils::Operand;
use crate::tensor::broadcast_utils::{can_broadcast_to, BroadcastIndexer};
use crate::tensor::utils::index_to_coord;
use crate::tensor::Tensor;

/// Backward operation for the expand operation: sums the gradient back over
/// the broadcast dimensions.
#[derive(Debug)]
struct ExpandBackward {
    input_shape: Vec<usize>,
}

impl BackwardOp for ExpandBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        Ok(vec![sum_to_op(&grad_outputs[0], &self.input_shape)?.into()])
    }
}

/// Broadcasts `input` to `target_shape` following NumPy rules.
pub fn expand_op(input: &Tensor, target_shape: &[usize]) -> Result<Tensor, DygraphError> {
    let x = Operand::read(input);
    if !can_broadcast_to(&x.shape, target_shape) {
        return Err(DygraphError::BroadcastError {
            shape1: x.shape,
            shape2: target_shape.to_vec(),
        });
    }
    let numel: usize = target_shape.iter().product();
    let indexer = BroadcastIndexer::new(&x.shape, target_shape.len());
    let data = (0..numel)
        .map(|i| x.data[indexer.index(&index_to_coord(i, target_shape))])
        .collect();
    let output = Tensor::from_f64_as(x.dtype, data, target_shape.to_vec())?;
    if needs_record(&[input]) {
        record_operation(
            "expand",
            &[input],
            &[&output],
            ExpandBackward { input_shape: x.shape },
        );
    }
    Ok(output)
}

#[cfg(test)]
#[path = "expand_test.rs"]
mod tests;
