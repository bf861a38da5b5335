use crate::autograd::{grad, GradOptions};
use crate::tensor::Tensor;

/// Checks if two tensors are approximately equal (shape and data within tolerance).
/// Works for either dtype; data is compared widened to `f64`.
/// Panics if shapes differ or data differs significantly.
pub fn check_tensor_near(
    actual: &Tensor,
    expected_shape: &[usize],
    expected_data: &[f64],
    tolerance: f64,
) {
    assert_eq!(actual.shape(), expected_shape, "Shape mismatch");

    let actual_data_vec = actual.to_f64_vec();
    assert_eq!(
        actual_data_vec.len(),
        expected_data.len(),
        "Data length mismatch"
    );

    for (i, (a, e)) in actual_data_vec.iter().zip(expected_data.iter()).enumerate() {
        let diff = (a - e).abs();
        if diff > tolerance || diff.is_nan() {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}

/// Helper to create a simple f32 constant tensor for testing purposes.
pub fn create_test_tensor(data: Vec<f32>, shape: Vec<usize>) -> Tensor {
    Tensor::new(data, shape).expect("Failed to create test tensor")
}

/// Helper to create an f64 tensor that takes part in differentiation.
pub fn create_test_tensor_with_grad(data: Vec<f64>, shape: Vec<usize>) -> Tensor {
    let tensor = Tensor::new_f64(data, shape).expect("Failed to create test tensor with grad");
    tensor.set_stop_gradient(false);
    tensor
}

/// First-order gradients of `output` with respect to `inputs`, seeded with ones.
pub fn first_order_grads(output: &Tensor, inputs: &[Tensor]) -> Vec<Tensor> {
    grad(&[output.clone()], inputs, GradOptions::new())
        .expect("grad failed")
        .into_iter()
        .map(|g| g.into_option().expect("gradient is undefined"))
        .collect()
}
