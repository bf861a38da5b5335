//! Operations with a constant scalar operand.

use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::utils::unary_map;
use crate::tensor::Tensor;

#[derive(Debug)]
struct ScaleBackward {
    factor: f64,
}

impl BackwardOp for ScaleBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        Ok(vec![scale_op(&grad_outputs[0], self.factor)?.into()])
    }
}

/// `factor * input`.
pub fn scale_op(input: &Tensor, factor: f64) -> Result<Tensor, DygraphError> {
    let output = unary_map(input, |x| x * factor)?;
    if needs_record(&[input]) {
        record_operation("scale", &[input], &[&output], ScaleBackward { factor });
    }
    Ok(output)
}

#[derive(Debug)]
struct AddScalarBackward;

impl BackwardOp for AddScalarBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        Ok(vec![grad_outputs[0].clone().into()])
    }
}

/// `input + value`.
pub fn add_scalar_op(input: &Tensor, value: f64) -> Result<Tensor, DygraphError> {
    let output = unary_map(input, |x| x + value)?;
    if needs_record(&[input]) {
        record_operation("add_scalar", &[input], &[&output], AddScalarBackward);
    }
    Ok(output)
}
