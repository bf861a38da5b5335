use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::arithmetic::{mul_op, scale_op};
use crate::ops::utils::unary_map;
use crate::tensor::{zeros_like, Tensor};

#[derive(Debug)]
struct PowScalarBackward {
    input: Tensor,
    exponent: f64,
}

impl BackwardOp for PowScalarBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        if self.exponent == 0.0 {
            return Ok(vec![zeros_like(&self.input)?.into()]);
        }
        // d/dx x^p = p * x^(p-1)
        let local = scale_op(&pow_scalar_op(&self.input, self.exponent - 1.0)?, self.exponent)?;
        Ok(vec![mul_op(&grad_outputs[0], &local)?.into()])
    }
}

/// Element-wise `input ^ exponent`.
pub fn pow_scalar_op(input: &Tensor, exponent: f64) -> Result<Tensor, DygraphError> {
    let output = unary_map(input, |x| x.powf(exponent))?;
    if needs_record(&[input]) {
        record_operation(
            "pow_scalar",
            &[input],
            &[&output],
            PowScalarBackward {
                input: input.clone(),
                exponent,
            },
        );
    }
    Ok(output)
}

#[cfg(test)]
#[path = "pow_test.rs"]
mod tests;
