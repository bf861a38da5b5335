use crate::autograd::accumulator::{NodeAccumulator, SEED_KEY};
use crate::autograd::grad_mode::GradModeGuard;
use crate::autograd::graph::{NodeIdx, RecordIdx, SubGraph};
use crate::autograd::{hooks, Gradient, NodeId};
use crate::config::EngineConfig;
use crate::error::DygraphError;
use crate::ops::scale_op;
use crate::tensor::{ones, zeros, Tensor};
use std::collections::{BinaryHeap, HashSet, VecDeque};

/// Options of a `grad` call.
#[derive(Debug, Clone)]
pub struct GradOptions {
    /// One seed per output; `None` entries (or `None` overall) mean ones.
    pub grad_outputs: Option<Vec<Option<Tensor>>>,
    /// Nodes that absorb no gradient and propagate nothing upstream.
    pub no_grad_vars: Vec<Tensor>,
    /// Keep the traversed records usable. Defaults to `create_graph`.
    pub retain_graph: Option<bool>,
    /// Record the backward computation so the results can be differentiated.
    pub create_graph: bool,
    /// Return `Gradient::Undefined` for unreachable inputs instead of failing.
    pub allow_unused: bool,
    pub config: EngineConfig,
}

impl Default for GradOptions {
    fn default() -> Self {
        GradOptions {
            grad_outputs: None,
            no_grad_vars: Vec::new(),
            retain_graph: None,
            create_graph: false,
            allow_unused: false,
            config: EngineConfig::global(),
        }
    }
}

impl GradOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grad_outputs(mut self, grad_outputs: Vec<Option<Tensor>>) -> Self {
        self.grad_outputs = Some(grad_outputs);
        self
    }

    pub fn no_grad_vars(mut self, no_grad_vars: Vec<Tensor>) -> Self {
        self.no_grad_vars = no_grad_vars;
        self
    }

    pub fn retain_graph(mut self, retain_graph: bool) -> Self {
        self.retain_graph = Some(retain_graph);
        self
    }

    pub fn create_graph(mut self, create_graph: bool) -> Self {
        self.create_graph = create_graph;
        self
    }

    pub fn allow_unused(mut self, allow_unused: bool) -> Self {
        self.allow_unused = allow_unused;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sort_sum_gradient(mut self, sort_sum_gradient: bool) -> Self {
        self.config.sort_sum_gradient = sort_sum_gradient;
        self
    }
}

/// Computes the gradients of `outputs` with respect to `inputs`.
///
/// Returns one `Gradient` per input, in input order. With `create_graph` the
/// results are themselves differentiable (`stop_gradient == false`); otherwise
/// they are detached.
///
/// # Errors
/// - `InvalidArgument`: empty `outputs` or `inputs`, an output with
///   `stop_gradient`, or `grad_outputs` of the wrong length.
/// - `DuplicateNode`: the same tensor twice in `outputs` or in `inputs`.
/// - `ShapeMismatch` / `DataTypeMismatch`: a seed that does not match its output.
/// - `UnusedInput`: an input received no gradient and `allow_unused` is false.
/// - `GraphReleased`: the traversal needs a record released by an earlier call.
pub fn grad(
    outputs: &[Tensor],
    inputs: &[Tensor],
    options: GradOptions,
) -> Result<Vec<Gradient>, DygraphError> {
    if outputs.is_empty() {
        return Err(DygraphError::InvalidArgument(
            "grad() requires at least one output".to_string(),
        ));
    }
    if inputs.is_empty() {
        return Err(DygraphError::InvalidArgument(
            "grad() requires at least one input".to_string(),
        ));
    }
    check_unique(outputs, "outputs")?;
    check_unique(inputs, "inputs")?;
    for (index, output) in outputs.iter().enumerate() {
        if output.stop_gradient() {
            return Err(DygraphError::InvalidArgument(format!(
                "output {} has stop_gradient=true and cannot be differentiated",
                index
            )));
        }
    }
    let grad_outputs = match options.grad_outputs {
        Some(grad_outputs) if grad_outputs.len() != outputs.len() => {
            return Err(DygraphError::InvalidArgument(format!(
                "grad_outputs has {} entries for {} outputs",
                grad_outputs.len(),
                outputs.len()
            )));
        }
        Some(grad_outputs) => grad_outputs,
        None => vec![None; outputs.len()],
    };
    let seeds = resolve_seeds(outputs, grad_outputs)?;
    let blocked: HashSet<NodeId> = options.no_grad_vars.iter().map(Tensor::id).collect();
    let create_graph = options.create_graph;
    let retain_graph = options.retain_graph.unwrap_or(create_graph);

    let targets = Targets::Inputs(inputs);
    let mut task = GraphTask::build(outputs, seeds, &blocked, targets, options.config)?;
    let results = task.execute(create_graph)?;

    let gradients = results
        .into_iter()
        .enumerate()
        .map(|(index, (_, value))| match value {
            Some(value) => Ok(Gradient::Value(finish_result(value, create_graph)?)),
            None if options.allow_unused => Ok(Gradient::Undefined),
            None => Err(DygraphError::UnusedInput { index }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if !retain_graph {
        task.release_executed();
    }
    Ok(gradients)
}

/// Back-propagates from `root` into every reachable leaf and adds the results
/// to the leaves' persistent gradient stores. Recording stays off.
pub(crate) fn run_backward(
    root: &Tensor,
    grad: Option<&Tensor>,
    retain_graph: bool,
) -> Result<(), DygraphError> {
    let outputs = std::slice::from_ref(root);
    let seeds = resolve_seeds(outputs, vec![grad.cloned()])?;
    let blocked = HashSet::new();
    let config = EngineConfig::global();
    let mut task = GraphTask::build(outputs, seeds, &blocked, Targets::Leaves, config)?;
    let results = task.execute(false)?;
    for (leaf, value) in results {
        if let Some(value) = value {
            leaf.accumulate_gradient(value.detach())?;
        }
    }
    if !retain_graph {
        task.release_executed();
    }
    Ok(())
}

fn check_unique(tensors: &[Tensor], argument: &str) -> Result<(), DygraphError> {
    let mut seen = HashSet::with_capacity(tensors.len());
    for tensor in tensors {
        let id = tensor.id();
        if !seen.insert(id) {
            return Err(DygraphError::DuplicateNode {
                argument: argument.to_string(),
                node: id,
            });
        }
    }
    Ok(())
}

/// Pairs every output with its seed, defaulting to ones.
fn resolve_seeds(
    outputs: &[Tensor],
    grad_outputs: Vec<Option<Tensor>>,
) -> Result<Vec<Tensor>, DygraphError> {
    outputs
        .iter()
        .zip(grad_outputs)
        .map(|(output, seed)| {
            let shape = output.shape();
            let dtype = output.dtype();
            match seed {
                Some(seed) => {
                    if seed.shape() != shape {
                        return Err(DygraphError::ShapeMismatch {
                            expected: shape,
                            actual: seed.shape(),
                            operation: "grad_outputs".to_string(),
                        });
                    }
                    if seed.dtype() != dtype {
                        return Err(DygraphError::DataTypeMismatch {
                            expected: dtype,
                            actual: seed.dtype(),
                            operation: "grad_outputs".to_string(),
                        });
                    }
                    Ok(seed)
                }
                None => ones(&shape, dtype),
            }
        })
        .collect()
}

/// Every result is a node of its own: pass-through rules may hand the same
/// tensor to several inputs, or hand back a caller's seed.
fn finish_result(value: Tensor, create_graph: bool) -> Result<Tensor, DygraphError> {
    if !create_graph {
        return Ok(value.detach());
    }
    if value.stop_gradient() {
        // constant gradient: still handed out as a differentiable leaf
        let result = value.detach();
        result.set_stop_gradient(false);
        return Ok(result);
    }
    let _mode = GradModeGuard::new(true);
    scale_op(&value, 1.0)
}

enum Targets<'a> {
    Inputs(&'a [Tensor]),
    Leaves,
}

enum ReadyQueue {
    Fifo(VecDeque<RecordIdx>),
    Sorted(BinaryHeap<(u64, RecordIdx)>),
}

impl ReadyQueue {
    fn new(sorted: bool) -> Self {
        if sorted {
            ReadyQueue::Sorted(BinaryHeap::new())
        } else {
            ReadyQueue::Fifo(VecDeque::new())
        }
    }

    fn push(&mut self, seq: u64, record: RecordIdx) {
        match self {
            ReadyQueue::Fifo(queue) => queue.push_back(record),
            ReadyQueue::Sorted(heap) => heap.push((seq, record)),
        }
    }

    fn pop(&mut self) -> Option<RecordIdx> {
        match self {
            ReadyQueue::Fifo(queue) => queue.pop_front(),
            ReadyQueue::Sorted(heap) => heap.pop().map(|(_, record)| record),
        }
    }
}

/// One backward traversal over a pruned sub-graph.
struct GraphTask {
    graph: SubGraph,
    targets: Vec<(Tensor, Option<NodeIdx>)>,
    seeds: Vec<(NodeIdx, Tensor)>,
    config: EngineConfig,
    executed: Vec<RecordIdx>,
}

impl GraphTask {
    fn build(
        outputs: &[Tensor],
        seeds: Vec<Tensor>,
        blocked: &HashSet<NodeId>,
        targets: Targets<'_>,
        config: EngineConfig,
    ) -> Result<Self, DygraphError> {
        let mut graph = SubGraph::discover(outputs, blocked);
        let all_leaves = matches!(targets, Targets::Leaves);
        let targets: Vec<(Tensor, Option<NodeIdx>)> = match targets {
            Targets::Inputs(inputs) => inputs
                .iter()
                .map(|input| (input.clone(), graph.node_index(input.id())))
                .collect(),
            Targets::Leaves => graph
                .leaves()
                .into_iter()
                .map(|idx| (graph.nodes[idx].tensor.clone(), Some(idx)))
                .collect(),
        };
        let target_nodes: Vec<NodeIdx> = targets.iter().filter_map(|(_, idx)| *idx).collect();
        graph.prune_to(&target_nodes);

        if let Some(stale) = graph
            .useful_records()
            .find(|&idx| graph.records[idx].record.is_released())
        {
            return Err(DygraphError::GraphReleased {
                operation: graph.records[stale].record.name().to_string(),
            });
        }
        // a target cut off by a freed edge may have been reachable before the release
        if let Some(severed) = graph.severed {
            if all_leaves || targets.iter().any(|(_, idx)| idx.is_none()) {
                return Err(DygraphError::GraphReleased {
                    operation: graph.records[severed].record.name().to_string(),
                });
            }
        }

        // outputs listed in no_grad_vars were never entered and get no seed
        let seeds = outputs
            .iter()
            .zip(seeds)
            .filter_map(|(output, seed)| graph.node_index(output.id()).map(|idx| (idx, seed)))
            .collect();

        Ok(GraphTask {
            graph,
            targets,
            seeds,
            config,
            executed: Vec::new(),
        })
    }

    /// Runs the traversal and returns, for each target, its final gradient.
    fn execute(
        &mut self,
        create_graph: bool,
    ) -> Result<Vec<(Tensor, Option<Tensor>)>, DygraphError> {
        let _mode = GradModeGuard::new(create_graph);
        let graph = &self.graph;
        let sorted = self.config.sort_sum_gradient;
        let node_count = graph.nodes.len();

        let mut state = ExecutionState {
            accumulators: (0..node_count).map(|_| NodeAccumulator::new(sorted)).collect(),
            pending: vec![0; node_count],
            remaining: vec![0; graph.records.len()],
            finished: vec![None; node_count],
            ready: ReadyQueue::new(sorted),
        };
        let mut is_target = vec![false; node_count];
        for idx in self.targets.iter().filter_map(|(_, idx)| *idx) {
            is_target[idx] = true;
        }

        let mut useful_records = 0;
        for record_idx in graph.useful_records() {
            useful_records += 1;
            let record = &graph.records[record_idx];
            for &input in record.inputs.iter().flatten() {
                if graph.nodes[input].useful {
                    state.pending[input] += 1;
                }
            }
            state.remaining[record_idx] = record.outputs.iter().flatten().count();
        }
        log::debug!(
            "backward traversal: {} nodes, {} records ({} useful), {} targets, \
             create_graph={}, sort_sum_gradient={}",
            node_count,
            graph.records.len(),
            useful_records,
            self.targets.len(),
            create_graph,
            sorted
        );

        for (idx, seed) in &self.seeds {
            if graph.nodes[*idx].useful {
                state.accumulators[*idx].deposit(SEED_KEY, seed.clone())?;
            }
        }
        for idx in 0..node_count {
            if graph.nodes[idx].useful && state.pending[idx] == 0 {
                state.finalize(graph, idx)?;
            }
        }

        while let Some(record_idx) = state.ready.pop() {
            let entry = &graph.records[record_idx];
            let record = &entry.record;

            let grad_outputs: Vec<Option<Tensor>> = entry
                .outputs
                .iter()
                .map(|output| match output {
                    Some(idx) if is_target[*idx] => state.finished[*idx].clone(),
                    Some(idx) => state.finished[*idx].take(),
                    None => None,
                })
                .collect();

            let input_grads = if grad_outputs.iter().any(Option::is_some) {
                let filled = grad_outputs
                    .into_iter()
                    .enumerate()
                    .map(|(slot, grad)| match grad {
                        Some(grad) => Ok(grad),
                        None => {
                            let meta = record.output_meta(slot).ok_or_else(|| {
                                DygraphError::InternalError(format!(
                                    "record '{}' has no output slot {}",
                                    record.name(),
                                    slot
                                ))
                            })?;
                            zeros(&meta.shape, meta.dtype)
                        }
                    })
                    .collect::<Result<Vec<_>, DygraphError>>()?;
                log::trace!("running backward of '{}' (seq {})", record.name(), record.seq());
                let grads = record.run_backward(&filled)?;
                self.executed.push(record_idx);
                grads
            } else {
                log::trace!(
                    "skipping '{}' (seq {}): no output received a gradient",
                    record.name(),
                    record.seq()
                );
                vec![Gradient::Undefined; entry.inputs.len()]
            };

            for (edge, grad) in input_grads.into_iter().enumerate() {
                let Some(idx) = entry.inputs[edge] else {
                    continue;
                };
                let node = &graph.nodes[idx];
                if !node.useful {
                    continue;
                }
                if let Gradient::Value(grad) = grad {
                    let shape = grad.shape();
                    if shape != node.shape {
                        return Err(DygraphError::ShapeMismatch {
                            expected: node.shape.clone(),
                            actual: shape,
                            operation: format!("backward of '{}'", record.name()),
                        });
                    }
                    state.accumulators[idx].deposit(record.seq(), grad)?;
                }
                state.pending[idx] -= 1;
                if state.pending[idx] == 0 {
                    state.finalize(graph, idx)?;
                }
            }
        }

        Ok(self
            .targets
            .iter()
            .map(|(tensor, idx)| {
                let value = idx.and_then(|idx| state.finished[idx].clone());
                (tensor.clone(), value)
            })
            .collect())
    }

    fn release_executed(&self) {
        for &record_idx in &self.executed {
            self.graph.records[record_idx].record.release();
        }
        log::debug!("released {} records", self.executed.len());
    }
}

struct ExecutionState {
    accumulators: Vec<NodeAccumulator>,
    /// Useful consumer edges still to deposit, per node.
    pending: Vec<usize>,
    /// Outputs not yet finalized, per record.
    remaining: Vec<usize>,
    finished: Vec<Option<Tensor>>,
    ready: ReadyQueue,
}

impl ExecutionState {
    /// Every deposit into `idx` has happened: collapse, run hooks, and release
    /// the producing record if this was its last pending output.
    fn finalize(&mut self, graph: &SubGraph, idx: NodeIdx) -> Result<(), DygraphError> {
        let node = &graph.nodes[idx];
        log::trace!(
            "node {} final after {} contributions",
            node.tensor.id(),
            self.accumulators[idx].count()
        );
        let value = self.accumulators[idx].finish()?;
        if let Some(value) = &value {
            hooks::dispatch(&node.tensor, value);
        }
        self.finished[idx] = value;

        if let Some((record_idx, _)) = node.producer {
            if graph.records[record_idx].useful {
                self.remaining[record_idx] -= 1;
                if self.remaining[record_idx] == 0 {
                    let seq = graph.records[record_idx].record.seq();
                    self.ready.push(seq, record_idx);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
