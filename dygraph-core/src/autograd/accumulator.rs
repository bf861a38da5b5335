use crate::error::DygraphError;
use crate::ops::arithmetic::add_op;
use crate::tensor::Tensor;

/// Persistent gradient store of a node, filled by `Tensor::backward`.
///
/// Repeated backward passes add into the stored value.
#[derive(Debug, Default, Clone)]
pub struct GradAccumulator {
    value: Option<Tensor>,
    contributions: usize,
}

impl GradAccumulator {
    pub fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    /// Number of backward passes that deposited into this store since the last reset.
    pub fn contributions(&self) -> usize {
        self.contributions
    }

    pub(crate) fn store(&mut self, value: Tensor) {
        self.value = Some(value);
        self.contributions += 1;
    }

    pub fn reset(&mut self) {
        self.value = None;
        self.contributions = 0;
    }
}

/// Sort key of the seed contribution; it sums before any produced gradient.
pub(crate) const SEED_KEY: u64 = u64::MAX;

/// Collects the contributions flowing into one node during a single traversal.
///
/// `Eager` adds every contribution on arrival. `Sorted` buffers contributions
/// and sums them once the node is complete, ordered by descending key (the
/// producing record's sequence number), which makes floating-point summation
/// independent of scheduling.
#[derive(Debug)]
pub(crate) enum NodeAccumulator {
    Eager { sum: Option<Tensor>, count: usize },
    Sorted { parts: Vec<(u64, Tensor)> },
}

impl NodeAccumulator {
    pub(crate) fn new(sorted: bool) -> Self {
        if sorted {
            NodeAccumulator::Sorted { parts: Vec::new() }
        } else {
            NodeAccumulator::Eager { sum: None, count: 0 }
        }
    }

    pub(crate) fn deposit(&mut self, key: u64, grad: Tensor) -> Result<(), DygraphError> {
        match self {
            NodeAccumulator::Eager { sum, count } => {
                *sum = Some(match sum.take() {
                    Some(current) => add_op(&current, &grad)?,
                    None => grad,
                });
                *count += 1;
            }
            NodeAccumulator::Sorted { parts } => parts.push((key, grad)),
        }
        Ok(())
    }

    pub(crate) fn count(&self) -> usize {
        match self {
            NodeAccumulator::Eager { count, .. } => *count,
            NodeAccumulator::Sorted { parts } => parts.len(),
        }
    }

    /// Collapses the contributions into the node's gradient. `None` if nothing
    /// was deposited.
    pub(crate) fn finish(&mut self) -> Result<Option<Tensor>, DygraphError> {
        match self {
            NodeAccumulator::Eager { sum, .. } => Ok(sum.take()),
            NodeAccumulator::Sorted { parts } => {
                let mut parts = std::mem::take(parts);
                // stable: equal keys keep arrival order
                parts.sort_by(|a, b| b.0.cmp(&a.0));
                let mut iter = parts.into_iter();
                let Some((_, first)) = iter.next() else {
                    return Ok(None);
                };
                iter.try_fold(first, |acc, (_, grad)| add_op(&acc, &grad))
                    .map(Some)
            }
        }
    }
}

#[cfg(test)]
#[path = "accumulator_test.rs"]
mod tests;
