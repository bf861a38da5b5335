use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::arithmetic::scale_op;
use crate::ops::utils::Operand;
use crate::ops::view::expand_op;
use crate::tensor::Tensor;

#[derive(Debug)]
struct MeanBackward {
    input_shape: Vec<usize>,
    numel: usize,
}

impl BackwardOp for MeanBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        let expanded = expand_op(&grad_outputs[0], &self.input_shape)?;
        Ok(vec![scale_op(&expanded, 1.0 / self.numel as f64)?.into()])
    }
}

/// Mean of all elements, as a 0-dimensional tensor.
///
/// # Errors
/// `InvalidArgument` on an empty tensor.
pub fn mean_op(input: &Tensor) -> Result<Tensor, DygraphError> {
    let x = Operand::read(input);
    let numel = x.data.len();
    if numel == 0 {
        return Err(DygraphError::InvalidArgument(
            "mean of an empty tensor is undefined".to_string(),
        ));
    }
    let mean = x.data.iter().sum::<f64>() / numel as f64;
    let output = Tensor::from_f64_as(x.dtype, vec![mean], Vec::new())?;
    if needs_record(&[input]) {
        record_operation(
            "mean",
            &[input],
            &[&output],
            MeanBackward {
                input_shape: x.shape,
                numel,
            },
        );
    }
    Ok(output)
}

#[cfg(test)]
#[path = "mean_test.rs"]
mod tests;
