use approx::relative_eq;
use dygraph_core::tensor::uniform;
use dygraph_core::{DType, Tensor};
use rand::rngs::StdRng;
use rand::SeedableRng;

// Shared by several test binaries; not every binary uses every helper.
#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// f64 tensor with `stop_gradient = false`.
#[allow(dead_code)]
pub fn param_f64(data: Vec<f64>, shape: Vec<usize>) -> Tensor {
    let tensor = Tensor::new_f64(data, shape).expect("Test tensor creation failed");
    tensor.set_stop_gradient(false);
    tensor
}

/// Seeded uniform f64 parameter. Values are kept away from zero so that relu
/// masks are stable under the finite differences of grad checks.
#[allow(dead_code)]
pub fn random_param(shape: &[usize], seed: u64) -> Tensor {
    let mut rng = StdRng::seed_from_u64(seed);
    let raw = uniform(shape, -1.0, 1.0, DType::F64, &mut rng).expect("uniform failed");
    let data: Vec<f64> = raw
        .to_f64_vec()
        .into_iter()
        .map(|v| if v.abs() < 0.05 { v.signum() * 0.05 + v } else { v })
        .collect();
    param_f64(data, shape.to_vec())
}

#[allow(dead_code)]
pub fn assert_all_close(actual: &[f64], expected: &[f64], rtol: f64) {
    assert_eq!(actual.len(), expected.len(), "Data length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            relative_eq!(*a, *e, epsilon = rtol, max_relative = rtol),
            "Data mismatch at index {}: actual={}, expected={}",
            i,
            a,
            e
        );
    }
}
