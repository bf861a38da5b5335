use super::*;
use crate::ops::arithmetic::{add_op, add_scalar_op, mul_op, scale_op};
use crate::ops::reduction::sum_op;
use crate::ops::view::split_op;
use crate::types::DType;
use crate::utils::testing::{check_tensor_near, create_test_tensor_with_grad};
use std::sync::{Arc, Mutex};

fn value(g: &Gradient) -> &Tensor {
    g.value().expect("expected a defined gradient")
}

#[test]
fn test_grad_of_output_with_respect_to_itself_is_the_seed() {
    let x = create_test_tensor_with_grad(vec![1.0, 2.0], vec![2]);
    let grads = grad(&[x.clone()], &[x.clone()], GradOptions::new()).unwrap();
    check_tensor_near(value(&grads[0]), &[2], &[1.0, 1.0], 0.0);
    assert!(value(&grads[0]).stop_gradient());
}

#[test]
fn test_output_also_reached_through_another_output() {
    let x = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let y = add_scalar_op(&x, 1.0).unwrap();
    let grads = grad(&[y, x.clone()], &[x], GradOptions::new()).unwrap();
    check_tensor_near(value(&grads[0]), &[1], &[2.0], 0.0);
}

#[test]
fn test_argument_validation() {
    let x = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let y = scale_op(&x, 2.0).unwrap();
    let c = Tensor::new_f64(vec![1.0], vec![1]).unwrap();

    assert!(matches!(
        grad(&[], &[x.clone()], GradOptions::new()),
        Err(DygraphError::InvalidArgument(_))
    ));
    assert!(matches!(
        grad(&[y.clone()], &[], GradOptions::new()),
        Err(DygraphError::InvalidArgument(_))
    ));
    assert!(matches!(
        grad(&[c], &[x.clone()], GradOptions::new()),
        Err(DygraphError::InvalidArgument(_))
    ));
    assert!(matches!(
        grad(
            &[y.clone()],
            &[x.clone()],
            GradOptions::new().grad_outputs(vec![None, None])
        ),
        Err(DygraphError::InvalidArgument(_))
    ));
}

#[test]
fn test_duplicates_are_rejected() {
    let x = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let y = scale_op(&x, 2.0).unwrap();
    let err = grad(&[y.clone()], &[x.clone(), x.clone()], GradOptions::new()).unwrap_err();
    assert_eq!(
        err,
        DygraphError::DuplicateNode {
            argument: "inputs".to_string(),
            node: x.id()
        }
    );
    let err = grad(&[y.clone(), y.clone()], &[x], GradOptions::new()).unwrap_err();
    assert!(matches!(
        err,
        DygraphError::DuplicateNode { ref argument, .. } if argument == "outputs"
    ));
}

#[test]
fn test_seed_shape_is_checked_before_traversal() {
    let x = create_test_tensor_with_grad(vec![1.0, 2.0], vec![2]);
    let y = mul_op(&x, &x).unwrap();
    let bad = Tensor::new_f64(vec![1.0, 1.0, 1.0], vec![3]).unwrap();
    let err = grad(
        &[y.clone()],
        &[x.clone()],
        GradOptions::new().grad_outputs(vec![Some(bad)]),
    )
    .unwrap_err();
    assert!(matches!(err, DygraphError::ShapeMismatch { .. }));
    // nothing was released: the graph is still usable
    assert!(grad(&[y], &[x], GradOptions::new()).is_ok());
}

#[test]
fn test_seed_scales_result() {
    let x = create_test_tensor_with_grad(vec![1.0, 2.0], vec![2]);
    let y = mul_op(&x, &x).unwrap();
    let seed = Tensor::new_f64(vec![3.0, -1.0], vec![2]).unwrap();
    let grads = grad(&[y], &[x], GradOptions::new().grad_outputs(vec![Some(seed)])).unwrap();
    check_tensor_near(value(&grads[0]), &[2], &[6.0, -4.0], 1e-12);
}

#[test]
fn test_unused_input_policy() {
    let x = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let y = create_test_tensor_with_grad(vec![2.0], vec![1]);
    let out = scale_op(&x, 3.0).unwrap();

    let options = GradOptions::new().retain_graph(true);
    let err = grad(&[out.clone()], &[x.clone(), y.clone()], options).unwrap_err();
    assert_eq!(err, DygraphError::UnusedInput { index: 1 });

    let grads = grad(&[out], &[x, y], GradOptions::new().allow_unused(true)).unwrap();
    check_tensor_near(value(&grads[0]), &[1], &[3.0], 0.0);
    assert!(matches!(grads[1], Gradient::Undefined));
}

#[test]
fn test_unused_input_error_does_not_release() {
    let x = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let y = create_test_tensor_with_grad(vec![2.0], vec![1]);
    let out = scale_op(&x, 3.0).unwrap();
    assert!(grad(&[out.clone()], &[x.clone(), y], GradOptions::new()).is_err());
    assert!(grad(&[out], &[x], GradOptions::new()).is_ok());
}

#[test]
fn test_stop_gradient_input_is_unused() {
    let x = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let c = Tensor::new_f64(vec![2.0], vec![1]).unwrap();
    let out = mul_op(&x, &c).unwrap();
    let grads = grad(&[out], &[c], GradOptions::new().allow_unused(true)).unwrap();
    assert!(!grads[0].is_defined());
}

#[test]
fn test_released_graph_is_reported() {
    let x = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let y = mul_op(&x, &x).unwrap();
    grad(&[y.clone()], &[x.clone()], GradOptions::new()).unwrap();
    let err = grad(&[y], &[x], GradOptions::new()).unwrap_err();
    assert_eq!(
        err,
        DygraphError::GraphReleased {
            operation: "mul".to_string()
        }
    );
}

#[test]
fn test_retain_graph_allows_repeated_traversal() {
    let x = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let y = mul_op(&x, &x).unwrap();
    for _ in 0..3 {
        let options = GradOptions::new().retain_graph(true);
        let grads = grad(&[y.clone()], &[x.clone()], options).unwrap();
        check_tensor_near(value(&grads[0]), &[1], &[2.0], 0.0);
    }
}

#[test]
fn test_create_graph_retains_by_default() {
    let x = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let y = mul_op(&x, &x).unwrap();
    grad(&[y.clone()], &[x.clone()], GradOptions::new().create_graph(true)).unwrap();
    assert!(grad(&[y], &[x], GradOptions::new()).is_ok());
}

#[test]
fn test_records_off_the_path_are_not_released() {
    // out = (a * a) + b; differentiating w.r.t. b never runs the mul record
    let a = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let b = create_test_tensor_with_grad(vec![2.0], vec![1]);
    let a2 = mul_op(&a, &a).unwrap();
    let out = add_op(&a2, &b).unwrap();
    grad(&[out.clone()], &[b], GradOptions::new()).unwrap();
    assert!(!a2.grad_fn().unwrap().record().is_released());
    assert!(out.grad_fn().unwrap().record().is_released());
    // a2 is still differentiable on its own
    let grads = grad(&[a2], &[a], GradOptions::new()).unwrap();
    check_tensor_near(value(&grads[0]), &[1], &[2.0], 0.0);
}

#[test]
fn test_result_stop_gradient_follows_create_graph() {
    let x = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let y = mul_op(&x, &x).unwrap();
    let detached = grad(&[y.clone()], &[x.clone()], GradOptions::new().retain_graph(true)).unwrap();
    assert!(value(&detached[0]).stop_gradient());
    assert!(value(&detached[0]).is_leaf());
    let attached = grad(&[y], &[x], GradOptions::new().create_graph(true)).unwrap();
    assert!(!value(&attached[0]).stop_gradient());
    assert!(!value(&attached[0]).is_leaf());
}

#[test]
fn test_no_grad_vars_block_propagation() {
    // out = x * y, y = 2x; blocking y leaves only the direct x edge: dout/dx = y
    let x = create_test_tensor_with_grad(vec![3.0], vec![1]);
    let y = scale_op(&x, 2.0).unwrap();
    let out = mul_op(&x, &y).unwrap();
    let grads = grad(
        &[out.clone()],
        &[x.clone()],
        GradOptions::new().no_grad_vars(vec![y.clone()]).retain_graph(true),
    )
    .unwrap();
    check_tensor_near(value(&grads[0]), &[1], &[6.0], 0.0);

    let grads = grad(&[out], &[x], GradOptions::new()).unwrap();
    check_tensor_near(value(&grads[0]), &[1], &[12.0], 0.0);
}

#[test]
fn test_output_in_no_grad_vars_gets_no_seed() {
    let x = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let a = scale_op(&x, 2.0).unwrap();
    let b = scale_op(&x, 5.0).unwrap();
    let grads = grad(
        &[a.clone(), b],
        &[x],
        GradOptions::new().no_grad_vars(vec![a]),
    )
    .unwrap();
    check_tensor_near(value(&grads[0]), &[1], &[5.0], 0.0);
}

#[test]
fn test_multi_output_with_single_seeded_piece() {
    let x = create_test_tensor_with_grad(vec![1.0, 2.0, 3.0], vec![3]);
    let pieces = split_op(&x, &[2, 1]).unwrap();
    let grads = grad(&[pieces[1].clone()], &[x], GradOptions::new()).unwrap();
    check_tensor_near(value(&grads[0]), &[3], &[0.0, 0.0, 1.0], 0.0);
}

#[test]
fn test_both_tie_break_modes_agree_on_exact_values() {
    let x = create_test_tensor_with_grad(vec![1.0, -2.0], vec![2]);
    let build = || {
        let a = mul_op(&x, &x).unwrap();
        let b = scale_op(&x, 3.0).unwrap();
        let c = mul_op(&a, &b).unwrap();
        sum_op(&add_op(&c, &a).unwrap()).unwrap()
    };
    let fifo = grad(&[build()], &[x.clone()], GradOptions::new().sort_sum_gradient(false)).unwrap();
    let sorted = grad(&[build()], &[x], GradOptions::new().sort_sum_gradient(true)).unwrap();
    // d/dx (3x^3 + x^2) = 9x^2 + 2x
    check_tensor_near(value(&fifo[0]), &[2], &[11.0, 32.0], 1e-12);
    check_tensor_near(value(&sorted[0]), &[2], &[11.0, 32.0], 1e-12);
}

#[test]
fn test_sorted_mode_is_independent_of_output_order() {
    // f32 sums whose rounding depends on the order of contributions
    let x = Tensor::new(vec![1.0], vec![1]).unwrap();
    x.set_stop_gradient(false);
    let a = scale_op(&x, 1.0e8).unwrap();
    let b = scale_op(&x, -1.0e8).unwrap();
    let c = scale_op(&x, 1.0).unwrap();
    let options = || GradOptions::new().sort_sum_gradient(true).retain_graph(true);

    let first = grad(&[a.clone(), b.clone(), c.clone()], &[x.clone()], options()).unwrap();
    let second = grad(&[c.clone(), a.clone(), b.clone()], &[x.clone()], options()).unwrap();
    let third = grad(&[b, c, a], &[x], options()).unwrap();
    let v1 = value(&first[0]).item().unwrap();
    assert_eq!(v1, value(&second[0]).item().unwrap());
    assert_eq!(v1, value(&third[0]).item().unwrap());
}

#[test]
fn test_hooks_run_once_in_registration_order() {
    let x = create_test_tensor_with_grad(vec![1.0, 2.0], vec![2]);
    let y = scale_op(&x, 2.0).unwrap();
    // y feeds two consumers; its hooks must see the summed gradient once
    let out = add_op(&mul_op(&y, &y).unwrap(), &y).unwrap();

    let log: Arc<Mutex<Vec<(u8, Vec<f64>)>>> = Arc::new(Mutex::new(Vec::new()));
    for tag in [1u8, 2, 3] {
        let log = Arc::clone(&log);
        y.register_hook(move |g| log.lock().unwrap().push((tag, g.to_f64_vec())));
    }
    grad(&[out], &[x], GradOptions::new()).unwrap();

    let log = log.lock().unwrap();
    let tags: Vec<u8> = log.iter().map(|(tag, _)| *tag).collect();
    assert_eq!(tags, vec![1, 2, 3]);
    // d/dy (y^2 + y) = 2y + 1 with y = [2, 4]
    for (_, g) in log.iter() {
        assert_eq!(g, &vec![5.0, 9.0]);
    }
}

#[test]
fn test_hooks_do_not_run_for_pruned_nodes() {
    let a = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let b = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let a2 = scale_op(&a, 2.0).unwrap();
    let out = add_op(&a2, &b).unwrap();
    let called = Arc::new(Mutex::new(0));
    {
        let called = Arc::clone(&called);
        a2.register_hook(move |_| *called.lock().unwrap() += 1);
    }
    grad(&[out], &[b], GradOptions::new()).unwrap();
    assert_eq!(*called.lock().unwrap(), 0);
}

#[test]
fn test_backward_fills_leaf_store_with_detached_values() {
    let x = create_test_tensor_with_grad(vec![1.0, 2.0], vec![2]);
    let w = create_test_tensor_with_grad(vec![3.0, 4.0], vec![2]);
    let out = sum_op(&mul_op(&x, &w).unwrap()).unwrap();
    out.backward(false).unwrap();
    let gx = x.gradient().unwrap();
    check_tensor_near(&gx, &[2], &[3.0, 4.0], 0.0);
    check_tensor_near(&w.gradient().unwrap(), &[2], &[1.0, 2.0], 0.0);
    assert!(gx.stop_gradient());
    assert!(out.backward(false).is_err());
}

#[test]
fn test_backward_with_seed_and_dtype_check() {
    let x = create_test_tensor_with_grad(vec![1.0, 2.0], vec![2]);
    let y = scale_op(&x, 2.0).unwrap();
    let wrong = Tensor::new(vec![1.0, 1.0], vec![2]).unwrap();
    assert!(matches!(
        y.backward_with(Some(&wrong), true),
        Err(DygraphError::DataTypeMismatch { .. })
    ));
    let seed = crate::tensor::full(&[2], 0.5, DType::F64).unwrap();
    y.backward_with(Some(&seed), false).unwrap();
    check_tensor_near(&x.gradient().unwrap(), &[2], &[1.0, 1.0], 0.0);
}

#[test]
fn test_grad_does_not_touch_leaf_store() {
    let x = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let y = mul_op(&x, &x).unwrap();
    grad(&[y], &[x.clone()], GradOptions::new()).unwrap();
    assert!(x.gradient().is_none());
}

#[test]
fn test_recording_state_is_restored_after_traversal() {
    let x = create_test_tensor_with_grad(vec![1.0], vec![1]);
    let y = mul_op(&x, &x).unwrap();
    {
        let _guard = crate::autograd::no_grad();
        grad(&[y.clone()], &[x.clone()], GradOptions::new().create_graph(true)).unwrap();
        assert!(!crate::autograd::is_grad_enabled());
    }
    assert!(crate::autograd::is_grad_enabled());
}

#[test]
fn test_pass_through_results_are_distinct_nodes() {
    // z = x + y hands the same upstream gradient to both operands
    let x = create_test_tensor_with_grad(vec![1.0, 2.0], vec![2]);
    let y = create_test_tensor_with_grad(vec![3.0, -1.0], vec![2]);
    let z = add_op(&x, &y).unwrap();
    let loss = sum_op(&mul_op(&z, &z).unwrap()).unwrap();

    let grads = grad(&[loss], &[x.clone(), y], GradOptions::new().create_graph(true)).unwrap();
    let (dx, dy) = (value(&grads[0]).clone(), value(&grads[1]).clone());
    assert_ne!(dx.id(), dy.id());
    check_tensor_near(&dx, &[2], &[8.0, 2.0], 1e-12);
    check_tensor_near(&dy, &[2], &[8.0, 2.0], 1e-12);

    let second = grad(&[dx.clone(), dy.clone()], &[x], GradOptions::new()).unwrap();
    check_tensor_near(value(&second[0]), &[2], &[4.0, 4.0], 1e-12);

    dx.set_stop_gradient(true);
    assert!(!dy.stop_gradient());
}

#[test]
fn test_result_for_output_and_its_producer_input_differ() {
    let y = create_test_tensor_with_grad(vec![1.0, -2.0], vec![2]);
    let z = add_scalar_op(&y, 1.0).unwrap();
    let w = sum_op(&mul_op(&z, &z).unwrap()).unwrap();

    let grads = grad(&[w], &[y, z], GradOptions::new().create_graph(true)).unwrap();
    assert_ne!(value(&grads[0]).id(), value(&grads[1]).id());
    check_tensor_near(value(&grads[0]), &[2], &[4.0, -2.0], 1e-12);
    check_tensor_near(value(&grads[1]), &[2], &[4.0, -2.0], 1e-12);
}

#[test]
fn test_differentiable_seed_is_not_handed_back() {
    let x = create_test_tensor_with_grad(vec![1.0, 2.0], vec![2]);
    let out = add_scalar_op(&x, 1.0).unwrap();
    let seed = create_test_tensor_with_grad(vec![0.5, -0.5], vec![2]);

    let options = GradOptions::new()
        .grad_outputs(vec![Some(seed.clone())])
        .create_graph(true);
    let grads = grad(&[out], &[x], options).unwrap();
    let dx = value(&grads[0]);
    assert_ne!(dx.id(), seed.id());
    check_tensor_near(dx, &[2], &[0.5, -0.5], 0.0);

    // still connected to the seed
    let back = grad(&[sum_op(dx).unwrap()], &[seed], GradOptions::new()).unwrap();
    check_tensor_near(value(&back[0]), &[2], &[1.0, 1.0], 0.0);
}

#[test]
fn test_backward_frees_dropped_intermediates() {
    let x = create_test_tensor_with_grad(vec![0.5; 1000], vec![1000]);
    let h = mul_op(&x, &x).unwrap();
    let weak = h.downgrade();
    let loss = sum_op(&h).unwrap();
    drop(h);
    assert!(Tensor::upgrade(&weak).is_some());

    loss.backward(false).unwrap();
    assert!(Tensor::upgrade(&weak).is_none());
    check_tensor_near(&x.gradient().unwrap(), &[1000], &[1.0; 1000], 0.0);
}

#[test]
fn test_retained_backward_keeps_intermediates() {
    let x = create_test_tensor_with_grad(vec![0.5; 4], vec![4]);
    let h = mul_op(&x, &x).unwrap();
    let weak = h.downgrade();
    let loss = sum_op(&h).unwrap();
    drop(h);

    loss.backward(true).unwrap();
    assert!(Tensor::upgrade(&weak).is_some());
    loss.backward(false).unwrap();
    assert!(Tensor::upgrade(&weak).is_none());
    check_tensor_near(&x.gradient().unwrap(), &[4], &[2.0; 4], 0.0);
}

#[test]
fn test_freed_graph_is_still_reported_as_released() {
    let x = create_test_tensor_with_grad(vec![1.0, 2.0], vec![2]);
    let loss = sum_op(&mul_op(&x, &x).unwrap()).unwrap();
    loss.backward(false).unwrap();

    let err = loss.backward(false).unwrap_err();
    assert_eq!(
        err,
        DygraphError::GraphReleased {
            operation: "sum".to_string()
        }
    );
    let err = grad(&[loss], &[x], GradOptions::new()).unwrap_err();
    assert!(matches!(err, DygraphError::GraphReleased { .. }));
}
