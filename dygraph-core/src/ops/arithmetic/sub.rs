use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::arithmetic::neg_op;
use crate::ops::utils::binary_map;
use crate::tensor::Tensor;

#[derive(Debug)]
struct SubBackward {
    a_shape: Vec<usize>,
    b_shape: Vec<usize>,
}

impl BackwardOp for SubBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        let grad = &grad_outputs[0];
        let grad_b = neg_op(grad)?.reduce_to_shape(&self.b_shape)?;
        Ok(vec![grad.reduce_to_shape(&self.a_shape)?.into(), grad_b.into()])
    }
}

/// Element-wise `a - b` with broadcasting.
pub fn sub_op(a: &Tensor, b: &Tensor) -> Result<Tensor, DygraphError> {
    let output = binary_map(a, b, "sub", |x, y| x - y)?;
    if needs_record(&[a, b]) {
        record_operation(
            "sub",
            &[a, b],
            &[&output],
            SubBackward {
                a_shape: a.shape(),
                b_shape: b.shape(),
            },
        );
    }
    Ok(output)
}
