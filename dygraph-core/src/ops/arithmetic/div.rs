use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::arithmetic::{mul_op, neg_op};
use crate::ops::utils::binary_map;
use crate::tensor::Tensor;

#[derive(Debug)]
struct DivBackward {
    a: Tensor,
    b: Tensor,
    a_shape: Vec<usize>,
    b_shape: Vec<usize>,
}

impl BackwardOp for DivBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        let grad = &grad_outputs[0];
        // grad_a = grad / b
        let grad_a = div_op(grad, &self.b)?.reduce_to_shape(&self.a_shape)?;
        // grad_b = -grad * a / b^2
        let b_squared = mul_op(&self.b, &self.b)?;
        let grad_b = neg_op(&div_op(&mul_op(grad, &self.a)?, &b_squared)?)?
            .reduce_to_shape(&self.b_shape)?;
        Ok(vec![grad_a.into(), grad_b.into()])
    }
}

/// Element-wise `a / b` with broadcasting. Division by zero follows IEEE rules.
pub fn div_op(a: &Tensor, b: &Tensor) -> Result<Tensor, DygraphError> {
    let output = binary_map(a, b, "div", |x, y| x / y)?;
    if needs_record(&[a, b]) {
        record_operation(
            "div",
            &[a, b],
            &[&output],
            DivBackward {
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
#[path = "div_test.rs"]
mod tests;
