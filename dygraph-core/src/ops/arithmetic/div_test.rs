use super::*;
use crate::autograd::grad_check::check_grad;
use crate::utils::testing::{check_tensor_near, create_test_tensor_with_grad, first_order_grads};

#[test]
fn test_div_forward_and_backward() {
    let a = create_test_tensor_with_grad(vec![1.0, 6.0], vec![2]);
    let b = create_test_tensor_with_grad(vec![2.0, 3.0], vec![2]);
    let c = div_op(&a, &b).unwrap();
    check_tensor_near(&c, &[2], &[0.5, 2.0], 1e-12);

    let grads = first_order_grads(&c, &[a, b]);
    check_tensor_near(&grads[0], &[2], &[0.5, 1.0 / 3.0], 1e-12);
    check_tensor_near(&grads[1], &[2], &[-0.25, -6.0 / 9.0], 1e-12);
}

#[test]
fn test_div_grad_check_broadcast() {
    let a = create_test_tensor_with_grad(vec![1.0, -2.0, 3.0, 0.5, 1.5, -0.7], vec![2, 3]);
    let b = create_test_tensor_with_grad(vec![1.3, 2.1, -1.7], vec![3]);
    let output_grad = Tensor::new_f64(vec![1.0, 0.5, -1.0, 2.0, 1.0, 0.3], vec![2, 3]).unwrap();
    check_grad(|xs| div_op(&xs[0], &xs[1]), &[a, b], &output_grad, 1e-6, 1e-5).unwrap();
}
