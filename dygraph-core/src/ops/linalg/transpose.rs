use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::utils::Operand;
use crate::tensor::Tensor;

#[derive(Debug)]
struct TransposeBackward;

impl BackwardOp for TransposeBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        Ok(vec![transpose_op(&grad_outputs[0])?.into()])
    }
}

/// Swaps the two axes of a 2-D tensor (the result is a contiguous copy).
pub fn transpose_op(input: &Tensor) -> Result<Tensor, DygraphError> {
    let x = Operand::read(input);
    if x.shape.len() != 2 {
        return Err(DygraphError::InvalidArgument(format!(
            "transpose expects a 2-D tensor, got shape {:?}",
            x.shape
        )));
    }
    let (rows, cols) = (x.shape[0], x.shape[1]);
    let mut data = Vec::with_capacity(rows * cols);
    for j in 0..cols {
        for i in 0..rows {
            data.push(x.data[i * cols + j]);
        }
    }
    let output = Tensor::from_f64_as(x.dtype, data, vec![cols, rows])?;
    if needs_record(&[input]) {
        record_operation("transpose", &[input], &[&output], TransposeBackward);
    }
    Ok(output)
}
