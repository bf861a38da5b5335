use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::utils::unary_map;
use crate::tensor::Tensor;

#[derive(Debug)]
struct NegBackward;

impl BackwardOp for NegBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        Ok(vec![neg_op(&grad_outputs[0])?.into()])
    }
}

pub fn neg_op(input: &Tensor) -> Result<Tensor, DygraphError> {
    let output = unary_map(input, |x| -x)?;
    if needs_record(&[input]) {
        record_operation("neg", &[input], &[&output], NegBackward);
    }
    Ok(output)
}
