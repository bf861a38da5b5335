use super::*;
use crate::autograd::{grad, GradOptions};
use crate::utils::testing::{check_tensor_near, create_test_tensor_with_grad, first_order_grads};

#[test]
fn test_mul_forward_broadcast() {
    let a = Tensor::new_f64(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
    let b = Tensor::new_f64(vec![10.0, 100.0], vec![2, 1]).unwrap();
    let c = mul_op(&a, &b).unwrap();
    check_tensor_near(&c, &[2, 2], &[10.0, 20.0, 300.0, 400.0], 1e-12);
}

#[test]
fn test_mul_backward() {
    let a = create_test_tensor_with_grad(vec![1.0, 2.0, 3.0], vec![3]);
    let b = create_test_tensor_with_grad(vec![4.0, 5.0, 6.0], vec![3]);
    let c = mul_op(&a, &b).unwrap();
    let grads = first_order_grads(&c, &[a, b]);
    check_tensor_near(&grads[0], &[3], &[4.0, 5.0, 6.0], 1e-12);
    check_tensor_near(&grads[1], &[3], &[1.0, 2.0, 3.0], 1e-12);
}

#[test]
fn test_mul_same_input_twice() {
    // z = x * x uses x through two edges of one record
    let x = create_test_tensor_with_grad(vec![3.0, -2.0], vec![2]);
    let z = mul_op(&x, &x).unwrap();
    let grads = first_order_grads(&z, &[x]);
    check_tensor_near(&grads[0], &[2], &[6.0, -4.0], 1e-12);
}

#[test]
fn test_mul_second_order() {
    // d/dx (x^2 * x) = 3x^2, d2/dx2 = 6x
    let x = create_test_tensor_with_grad(vec![2.0], vec![1]);
    let y = mul_op(&mul_op(&x, &x).unwrap(), &x).unwrap();
    let dx = grad(&[y], &[x.clone()], GradOptions::new().create_graph(true))
        .unwrap()
        .remove(0)
        .into_option()
        .unwrap();
    check_tensor_near(&dx, &[1], &[12.0], 1e-12);
    let ddx = first_order_grads(&dx, &[x]);
    check_tensor_near(&ddx[0], &[1], &[12.0], 1e-12);
}
