use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::utils::binary_map;
use crate::tensor::Tensor;

/// Backward operation context for element-wise addition.
#[derive(Debug)]
struct AddBackward {
    a_shape: Vec<usize>,
    b_shape: Vec<usize>,
}

impl BackwardOp for AddBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        let grad = &grad_outputs[0];
        Ok(vec![
            grad.reduce_to_shape(&self.a_shape)?.into(),
            grad.reduce_to_shape(&self.b_shape)?.into(),
        ])
    }
}

/// Element-wise `a + b` with broadcasting.
///
/// # Errors
/// `DataTypeMismatch` for mixed dtypes, `BroadcastError` for incompatible shapes.
pub fn add_op(a: &Tensor, b: &Tensor) -> Result<Tensor, DygraphError> {
    let output = binary_map(a, b, "add", |x, y| x + y)?;
    if needs_record(&[a, b]) {
        record_operation(
            "add",
            &[a, b],
            &[&output],
            AddBackward {
                a_shape: a.shape(),
                b_shape: b.shape(),
            },
        );
    }
    Ok(output)
}

#[cfg(test)]
#[path = "add_test.rs"]
mod tests;
