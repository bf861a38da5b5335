use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::arithmetic::{add_scalar_op, mul_op, neg_op};
use crate::ops::utils::{sigmoid, unary_map};
use crate::tensor::Tensor;

#[derive(Debug)]
struct SigmoidBackward {
    input: Tensor,
}

impl BackwardOp for SigmoidBackward {
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        // s * (1 - s), with s rebuilt from the input
        let s = sigmoid_op(&self.input)?;
        let one_minus_s = add_scalar_op(&neg_op(&s)?, 1.0)?;
        let local = mul_op(&s, &one_minus_s)?;
        Ok(vec![mul_op(&grad_outputs[0], &local)?.into()])
    }
}

/// Logistic function `1 / (1 + exp(-x))`.
pub fn sigmoid_op(input: &Tensor) -> Result<Tensor, DygraphError> {
    let output = unary_map(input, sigmoid::<f64>)?;
    if needs_record(&[input]) {
        record_operation(
            "sigmoid",
            &[input],
            &[&output],
            SigmoidBackward {
                input: input.clone(),
            },
        );
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::grad_check::check_grad;
    use crate::autograd::{grad, GradOptions};
    use crate::utils::testing::{check_tensor_near, create_test_tensor_with_grad};

    #[test]
    fn test_sigmoid_values() {
        let x = Tensor::new_f64(vec![0.0, 1000.0, -1000.0], vec![3]).unwrap();
        let y = sigmoid_op(&x).unwrap();
        check_tensor_near(&y, &[3], &[0.5, 1.0, 0.0], 1e-12);
    }

    #[test]
    fn test_sigmoid_grad_check() {
        let x = create_test_tensor_with_grad(vec![-1.5, 0.0, 0.3, 2.0], vec![4]);
        let output_grad = Tensor::new_f64(vec![1.0, -0.5, 2.0, 1.0], vec![4]).unwrap();
        check_grad(|xs| sigmoid_op(&xs[0]), &[x], &output_grad, 1e-6, 1e-6).unwrap();
    }

    #[test]
    fn test_sigmoid_second_derivative() {
        // s'' = s (1 - s) (1 - 2 s); at 0: 0, at ln(3): 0.75 * 0.25 * (1 - 1.5)
        let x = create_test_tensor_with_grad(vec![0.0, 3f64.ln()], vec![2]);
        let y = sigmoid_op(&x).unwrap();
        let dx = grad(&[y], &[x.clone()], GradOptions::new().create_graph(true))
            .unwrap()
            .remove(0)
            .into_option()
            .unwrap();
        check_tensor_near(&dx, &[2], &[0.25, 0.1875], 1e-12);
        let ddx = grad(&[dx], &[x], GradOptions::new())
            .unwrap()
            .remove(0)
            .into_option()
            .unwrap();
        check_tensor_near(&ddx, &[2], &[0.0, -0.09375], 1e-12);
    }
}
