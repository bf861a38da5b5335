use crate::autograd::backward_op::OperationRecord;
use crate::tensor::Tensor;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier of a tensor node in the dynamic graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        NodeId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

pub(crate) type NodeIdx = usize;
pub(crate) type RecordIdx = usize;

/// A tensor reached during discovery.
pub(crate) struct GraphNode {
    pub(crate) tensor: Tensor,
    pub(crate) shape: Vec<usize>,
    /// Record that produced this node and the output slot, if not a leaf.
    pub(crate) producer: Option<(RecordIdx, usize)>,
    /// One entry per input edge of a discovered record pointing at this node.
    pub(crate) consumers: Vec<RecordIdx>,
    /// On a path from an output to a target.
    pub(crate) useful: bool,
}

/// A record reached during discovery.
pub(crate) struct GraphRecord {
    pub(crate) record: Arc<OperationRecord>,
    /// Per input edge; `None` for inputs that do not take part (stop_gradient
    /// nodes and suppressed `no_grad_vars`).
    pub(crate) inputs: Vec<Option<NodeIdx>>,
    /// Per output slot; `None` for outputs not reached from the roots.
    pub(crate) outputs: Vec<Option<NodeIdx>>,
    pub(crate) useful: bool,
}

/// Index-addressed view of the part of the tape reachable backward from a set
/// of root tensors. Built once per traversal; records and nodes are numbered in
/// discovery order (breadth-first from the roots, inputs in edge order).
pub(crate) struct SubGraph {
    pub(crate) nodes: Vec<GraphNode>,
    pub(crate) records: Vec<GraphRecord>,
    /// First released record found with an input that no longer exists.
    pub(crate) severed: Option<RecordIdx>,
    index: HashMap<NodeId, NodeIdx>,
}

impl SubGraph {
    /// Walks the tape backward from `roots`. Nodes with `stop_gradient` and
    /// nodes listed in `blocked` are neither entered nor traversed past.
    pub(crate) fn discover(roots: &[Tensor], blocked: &HashSet<NodeId>) -> Self {
        let mut graph = SubGraph {
            nodes: Vec::new(),
            records: Vec::new(),
            severed: None,
            index: HashMap::new(),
        };
        let mut record_index: HashMap<u64, RecordIdx> = HashMap::new();
        let mut queue = VecDeque::new();

        for root in roots {
            graph.visit(root, blocked, &mut queue);
        }

        while let Some(node_idx) = queue.pop_front() {
            let grad_fn = graph.nodes[node_idx].tensor.read_data().grad_fn.clone();
            let Some(grad_fn) = grad_fn else {
                continue;
            };
            let record = grad_fn.record();
            let record_idx = match record_index.get(&record.seq()) {
                Some(&idx) => idx,
                None => {
                    let idx = graph.records.len();
                    record_index.insert(record.seq(), idx);
                    graph.records.push(GraphRecord {
                        record: Arc::clone(record),
                        inputs: vec![None; record.num_inputs()],
                        outputs: vec![None; record.num_outputs()],
                        useful: false,
                    });
                    for edge in 0..record.num_inputs() {
                        let Some(input) = record.input(edge) else {
                            // freed after release; whatever lay behind it is gone
                            graph.severed.get_or_insert(idx);
                            continue;
                        };
                        if let Some(input_idx) = graph.visit(&input, blocked, &mut queue) {
                            graph.records[idx].inputs[edge] = Some(input_idx);
                            graph.nodes[input_idx].consumers.push(idx);
                        }
                    }
                    idx
                }
            };
            graph.records[record_idx].outputs[grad_fn.slot()] = Some(node_idx);
            graph.nodes[node_idx].producer = Some((record_idx, grad_fn.slot()));
        }

        log::trace!(
            "discovered {} nodes and {} records from {} roots",
            graph.nodes.len(),
            graph.records.len(),
            roots.len()
        );
        graph
    }

    fn visit(
        &mut self,
        tensor: &Tensor,
        blocked: &HashSet<NodeId>,
        queue: &mut VecDeque<NodeIdx>,
    ) -> Option<NodeIdx> {
        let (id, stop_gradient, shape) = {
            let guard = tensor.read_data();
            (guard.id, guard.stop_gradient, guard.shape.clone())
        };
        if stop_gradient || blocked.contains(&id) {
            return None;
        }
        if let Some(&idx) = self.index.get(&id) {
            return Some(idx);
        }
        let idx = self.nodes.len();
        self.nodes.push(GraphNode {
            tensor: tensor.clone(),
            shape,
            producer: None,
            consumers: Vec::new(),
            useful: false,
        });
        self.index.insert(id, idx);
        queue.push_back(idx);
        Some(idx)
    }

    pub(crate) fn node_index(&self, id: NodeId) -> Option<NodeIdx> {
        self.index.get(&id).copied()
    }

    /// Discovered nodes not produced by any record.
    pub(crate) fn leaves(&self) -> Vec<NodeIdx> {
        (0..self.nodes.len())
            .filter(|&idx| self.nodes[idx].producer.is_none())
            .collect()
    }

    /// Keeps only what lies on a path from a root to one of `targets`: marks
    /// everything forward-reachable from the targets inside the discovered graph.
    pub(crate) fn prune_to(&mut self, targets: &[NodeIdx]) {
        let mut queue: VecDeque<NodeIdx> = VecDeque::new();
        for &target in targets {
            if !self.nodes[target].useful {
                self.nodes[target].useful = true;
                queue.push_back(target);
            }
        }
        while let Some(node_idx) = queue.pop_front() {
            for consumer_pos in 0..self.nodes[node_idx].consumers.len() {
                let record_idx = self.nodes[node_idx].consumers[consumer_pos];
                if self.records[record_idx].useful {
                    continue;
                }
                self.records[record_idx].useful = true;
                for slot in 0..self.records[record_idx].outputs.len() {
                    if let Some(output_idx) = self.records[record_idx].outputs[slot] {
                        if !self.nodes[output_idx].useful {
                            self.nodes[output_idx].useful = true;
                            queue.push_back(output_idx);
                        }
                    }
                }
            }
        }
    }

    pub(crate) fn useful_records(&self) -> impl Iterator<Item = RecordIdx> + '_ {
        (0..self.records.len()).filter(move |&idx| self.records[idx].useful)
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
