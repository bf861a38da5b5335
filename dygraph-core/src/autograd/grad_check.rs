use crate::autograd::grad_mode::no_grad;
use crate::autograd::{grad, GradOptions};
use crate::error::DygraphError;
use crate::ops::arithmetic::mul_op;
use crate::ops::reduction::sum_op;
use crate::tensor::Tensor;
use crate::types::DType;
use thiserror::Error;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for input tensor at index {input_index}, element index {element_index}: Analytical grad {analytical_grad:?} != Numerical grad {numerical_grad:?}. Difference: {difference:?}")]
    GradientMismatch {
        input_index: usize,
        element_index: usize,
        analytical_grad: f64,
        numerical_grad: f64,
        difference: f64,
    },
    #[error("Forward function execution failed during gradient check: {0}")]
    ForwardPassError(DygraphError),
    #[error("Backward pass execution failed during gradient check: {0}")]
    BackwardPassError(DygraphError),
    #[error("Tensor error during intermediate calculation: {0}")]
    TensorError(#[from] DygraphError),
    #[error("Unsupported data type for gradient check: expected F64, got {0:?}")]
    UnsupportedDType(DType),
    #[error("Input tensor {input_index} has stop_gradient=true; nothing to check.")]
    InputStopGradient { input_index: usize },
    #[error("Gradient check input tensor must be a leaf node (no grad_fn). Input index: {input_index}")]
    InputNotLeaf { input_index: usize },
    #[error("Numerical gradient is NaN or infinite for input {input_index}, element {element_index}. Details: Loss+: {loss_plus:?}, Loss-: {loss_minus:?}")]
    NumericalGradNaNOrInfinite {
        input_index: usize,
        element_index: usize,
        loss_plus: f64,
        loss_minus: f64,
    },
    #[error("Analytical gradient is NaN or infinite for input {input_index}, element {element_index}. Value: {value:?}")]
    AnalyticalGradNaNOrInfinite {
        input_index: usize,
        element_index: usize,
        value: f64,
    },
}

/// Checks analytical gradients against numerical gradients using central finite differences.
///
/// The scalar being differentiated is `sum(func(inputs) * output_grad)`. Inputs
/// must be F64 leaves with `stop_gradient == false`. An element passes when
/// `|analytical - numerical| <= tolerance * (1 + |numerical|)`.
pub fn check_grad<F>(
    func: F,
    inputs: &[Tensor],
    output_grad: &Tensor,
    epsilon: f64,
    tolerance: f64,
) -> Result<(), GradCheckError>
where
    F: Fn(&[Tensor]) -> Result<Tensor, DygraphError>,
{
    for (i, input) in inputs.iter().enumerate() {
        let dtype = input.dtype();
        if dtype != DType::F64 {
            return Err(GradCheckError::UnsupportedDType(dtype));
        }
        if input.stop_gradient() {
            return Err(GradCheckError::InputStopGradient { input_index: i });
        }
        if !input.is_leaf() {
            return Err(GradCheckError::InputNotLeaf { input_index: i });
        }
    }
    if output_grad.dtype() != DType::F64 {
        return Err(GradCheckError::UnsupportedDType(output_grad.dtype()));
    }

    // --- Analytical gradients ---
    let output = func(inputs).map_err(GradCheckError::ForwardPassError)?;
    let analytical = grad(
        &[output],
        inputs,
        GradOptions::new()
            .grad_outputs(vec![Some(output_grad.clone())])
            .allow_unused(true),
    )
    .map_err(GradCheckError::BackwardPassError)?;

    // --- Numerical gradients ---
    let _guard = no_grad();
    for (i, original_input) in inputs.iter().enumerate() {
        let numel = original_input.numel();
        let analytical_data = match analytical[i].value() {
            Some(g) => g.to_f64_vec(),
            None => vec![0.0; numel],
        };
        let original_data = original_input.to_f64_vec();
        let shape = original_input.shape();

        for elem_idx in 0..numel {
            let loss_at = |delta: f64| -> Result<f64, GradCheckError> {
                let mut data = original_data.clone();
                data[elem_idx] += delta;
                let mut perturbed_inputs = inputs.to_vec();
                perturbed_inputs[i] = Tensor::new_f64(data, shape.clone())?;
                let out = func(&perturbed_inputs).map_err(GradCheckError::ForwardPassError)?;
                calculate_loss(&out, output_grad)
            };
            let loss_plus = loss_at(epsilon)?;
            let loss_minus = loss_at(-epsilon)?;
            let numerical_grad = (loss_plus - loss_minus) / (2.0 * epsilon);
            let analytical_grad = analytical_data[elem_idx];

            if !numerical_grad.is_finite() {
                return Err(GradCheckError::NumericalGradNaNOrInfinite {
                    input_index: i,
                    element_index: elem_idx,
                    loss_plus,
                    loss_minus,
                });
            }
            if !analytical_grad.is_finite() {
                return Err(GradCheckError::AnalyticalGradNaNOrInfinite {
                    input_index: i,
                    element_index: elem_idx,
                    value: analytical_grad,
                });
            }

            let difference = (analytical_grad - numerical_grad).abs();
            if difference > tolerance * (1.0 + numerical_grad.abs()) {
                return Err(GradCheckError::GradientMismatch {
                    input_index: i,
                    element_index: elem_idx,
                    analytical_grad,
                    numerical_grad,
                    difference,
                });
            }
        }
    }

    Ok(())
}

/// `sum(output * output_grad)` as an `f64`.
fn calculate_loss(output: &Tensor, output_grad: &Tensor) -> Result<f64, GradCheckError> {
    if output.shape() != output_grad.shape() {
        return Err(GradCheckError::TensorError(DygraphError::ShapeMismatch {
            expected: output.shape(),
            actual: output_grad.shape(),
            operation: "calculate_loss (grad_check)".to_string(),
        }));
    }
    let weighted = mul_op(output, output_grad)?;
    Ok(sum_op(&weighted)?.item()?)
}
