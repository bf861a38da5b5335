use crate::autograd::{needs_record, record_operation, BackwardOp, Gradient};
use crate::error::DygraphError;
use crate::ops::linalg::transpose_op;
use crate::ops::utils::{check_same_dtype, Operand};
use crate::tensor::Tensor;

// --- Backward Operation ---

/// Backward context for 2-D matrix multiplication `C = A @ B`.
#[derive(Debug)]
struct MatmulBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for MatmulBackward {
    /// dA = dC @ B^T, dB = A^T @ dC
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError> {
        let grad = &grad_outputs[0];
        let grad_a = matmul_op(grad, &transpose_op(&self.b)?)?;
        let grad_b = matmul_op(&transpose_op(&self.a)?, grad)?;
        Ok(vec![grad_a.into(), grad_b.into()])
    }
}

// --- Forward Operation ---

/// Matrix product of two 2-D tensors `[m, k] @ [k, n] -> [m, n]`.
///
/// # Errors
/// `InvalidArgument` if either operand is not 2-D, `ShapeMismatch` if the inner
/// dimensions differ, `DataTypeMismatch` for mixed dtypes.
pub fn matmul_op(a: &Tensor, b: &Tensor) -> Result<Tensor, DygraphError> {
    let lhs = Operand::read(a);
    let rhs = Operand::read(b);
    check_same_dtype(lhs.dtype, rhs.dtype, "matmul")?;
    if lhs.shape.len() != 2 || rhs.shape.len() != 2 {
        return Err(DygraphError::InvalidArgument(format!(
            "matmul expects 2-D operands, got shapes {:?} and {:?}",
            lhs.shape, rhs.shape
        )));
    }
    let (m, k) = (lhs.shape[0], lhs.shape[1]);
    let (k2, n) = (rhs.shape[0], rhs.shape[1]);
    if k != k2 {
        return Err(DygraphError::ShapeMismatch {
            expected: vec![k, n],
            actual: rhs.shape.clone(),
            operation: "matmul".to_string(),
        });
    }

    let mut data = vec![0.0; m * n];
    for i in 0..m {
        for p in 0..k {
            let a_ip = lhs.data[i * k + p];
            for j in 0..n {
                data[i * n + j] += a_ip * rhs.data[p * n + j];
            }
        }
    }
    let output = Tensor::from_f64_as(lhs.dtype, data, vec![m, n])?;

    if needs_record(&[a, b]) {
        record_operation(
            "matmul",
            &[a, b],
            &[&output],
            MatmulBackward {
                a: a.clone(),
                b: b.clone(),
            },
        );
    }
    Ok(output)
}

#[cfg(test)]
#[path = "matmul_test.rs"]
mod tests;
