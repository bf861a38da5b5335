use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::utils::Operand;
use crate::tensor::Tensor;

#[derive(Debug)]
struct ReshapeBackward {
    input_shape: Vec<usize>,
}

impl BackwardOp for ReshapeBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        Ok(vec![reshape_op(&grad_outputs[0], &self.input_shape)?.into()])
    }
}

/// Reinterprets the elements of `input` (row-major) under `new_shape`.
///
/// # Errors
/// `ShapeMismatch` if the element counts differ.
pub fn reshape_op(input: &Tensor, new_shape: &[usize]) -> Result<Tensor, DygraphError> {
    let x = Operand::read(input);
    let new_numel: usize = new_shape.iter().product();
    if new_numel != x.data.len() {
        return Err(DygraphError::ShapeMismatch {
            expected: x.shape,
            actual: new_shape.to_vec(),
            operation: "reshape".to_string(),
        });
    }
    let output = Tensor::from_f64_as(x.dtype, x.data, new_shape.to_vec())?;
    if needs_record(&[input]) {
        record_operation(
            "reshape",
            &[input],
            &[&output],
            ReshapeBackward { input_shape: x.shape },
        );
    }
    Ok(output)
}
