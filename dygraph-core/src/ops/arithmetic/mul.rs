use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::utils::binary_map;
use crate::tensor::Tensor;

/// Backward operation context for multiplication.
///
/// Keeps the operand tensors themselves, not their data, so that a recorded
/// backward stays connected to them.
#[derive(Debug)]
struct MulBackward {
    a: Tensor,
    b: Tensor,
    a_shape: Vec<usize>,
    b_shape: Vec<usize>,
}

impl BackwardOp for MulBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        let grad = &grad_outputs[0];
        // grad_a = grad * b
        let grad_a = mul_op(grad, &self.b)?.reduce_to_shape(&self.a_shape)?;
        // grad_b = grad * a
        let grad_b = mul_op(grad, &self.a)?.reduce_to_shape(&self.b_shape)?;
        Ok(vec![grad_a.into(), grad_b.into()])
    }
}

/// Element-wise `a * b` with broadcasting.
pub fn mul_op(a: &Tensor, b: &Tensor) -> Result<Tensor, DygraphError> {
    let output = binary_map(a, b, "mul", |x, y| x * y)?;
    if needs_record(&[a, b]) {
        record_operation(
            "mul",
            &[a, b],
            &[&output],
            MulBackward {
                a: a.clone(),
                b: b.clone(),
                a_shape: a.shape(),
                b_shape: b.shape(),
            },
        );
    }
    Ok(output)
}

#[cfg(test)]
#[path = "mul_test.rs"]
mod tests;
