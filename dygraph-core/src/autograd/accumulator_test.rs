use super::*;
use crate::utils::testing::check_tensor_near;

fn t(values: Vec<f64>) -> Tensor {
    let n = values.len();
    Tensor::new_f64(values, vec![n]).unwrap()
}

#[test]
fn test_store_accumulator_counts_and_resets() {
    let mut acc = GradAccumulator::default();
    assert!(acc.value().is_none());
    acc.store(t(vec![1.0]));
    acc.store(t(vec![3.0]));
    assert_eq!(acc.contributions(), 2);
    check_tensor_near(acc.value().unwrap(), &[1], &[3.0], 0.0);
    acc.reset();
    assert!(acc.value().is_none());
    assert_eq!(acc.contributions(), 0);
}

#[test]
fn test_eager_sums_on_arrival() {
    let mut acc = NodeAccumulator::new(false);
    assert!(acc.finish().unwrap().is_none());
    acc.deposit(3, t(vec![1.0, 2.0])).unwrap();
    acc.deposit(9, t(vec![10.0, 20.0])).unwrap();
    assert_eq!(acc.count(), 2);
    check_tensor_near(&acc.finish().unwrap().unwrap(), &[2], &[11.0, 22.0], 0.0);
}

#[test]
fn test_single_contribution_is_passed_through() {
    let grad = t(vec![4.0]);
    let mut acc = NodeAccumulator::new(false);
    acc.deposit(0, grad.clone()).unwrap();
    assert!(acc.finish().unwrap().unwrap().same_node(&grad));
}

#[test]
fn test_sorted_sums_seed_first_then_latest_producer() {
    // In f32, (1e8 + 1) + -1e8 == 0 while (1e8 + -1e8) + 1 == 1: the order is observable.
    let big = Tensor::new(vec![1.0e8], vec![1]).unwrap();
    let neg_big = Tensor::new(vec![-1.0e8], vec![1]).unwrap();
    let one = Tensor::new(vec![1.0], vec![1]).unwrap();

    let mut acc = NodeAccumulator::new(true);
    acc.deposit(1, one.clone()).unwrap();
    acc.deposit(5, neg_big.clone()).unwrap();
    acc.deposit(SEED_KEY, big.clone()).unwrap();
    // order: seed (1e8), key 5 (-1e8), key 1 (1)
    assert_eq!(acc.finish().unwrap().unwrap().item().unwrap(), 1.0);

    let mut acc = NodeAccumulator::new(true);
    acc.deposit(5, one).unwrap();
    acc.deposit(1, neg_big).unwrap();
    acc.deposit(SEED_KEY, big).unwrap();
    // order: seed (1e8), key 5 (1), key 1 (-1e8)
    assert_eq!(acc.finish().unwrap().unwrap().item().unwrap(), 0.0);
}
