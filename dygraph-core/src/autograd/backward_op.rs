use crate::autograd::grad_mode::is_grad_enabled;
use crate::error::DygraphError;
use crate::tensor::Tensor;
use crate::tensor_data::TensorData;
use crate::types::DType;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

/// Gradient flowing to one input of an operation.
///
/// `Undefined` is a real value of the protocol, not a failure: it means "no
/// gradient flows along this edge" (for instance a constant input, or every
/// output gradient of the record being absent).
#[derive(Debug, Clone)]
pub enum Gradient {
    Value(Tensor),
    Undefined,
}

impl Gradient {
    pub fn is_defined(&self) -> bool {
        matches!(self, Gradient::Value(_))
    }

    pub fn value(&self) -> Option<&Tensor> {
        match self {
            Gradient::Value(tensor) => Some(tensor),
            Gradient::Undefined => None,
        }
    }

    pub fn into_option(self) -> Option<Tensor> {
        match self {
            Gradient::Value(tensor) => Some(tensor),
            Gradient::Undefined => None,
        }
    }
}

impl From<Tensor> for Gradient {
    fn from(tensor: Tensor) -> Self {
        Gradient::Value(tensor)
    }
}

impl From<Option<Tensor>> for Gradient {
    fn from(tensor: Option<Tensor>) -> Self {
        tensor.map_or(Gradient::Undefined, Gradient::Value)
    }
}

/// Defines the interface for the backward pass of a differentiable tensor operation.
///
/// Any operation that creates a non-leaf `Tensor` stores an implementation of this
/// trait in the `OperationRecord` it appends to the tape. The engine calls it with
/// one gradient per output of the operation, in output order.
///
/// Implementations must build their results with the regular tensor operations
/// so that, when the engine runs with `create_graph`, the gradient computation is
/// itself recorded and can be differentiated again.
pub trait BackwardOp: Debug + Send + Sync {
    /// Computes the gradient of each input given the gradient of each output.
    ///
    /// # Arguments
    /// * `grad_outputs`: one tensor per output, with the output's shape and dtype.
    ///   Missing output gradients are materialized as zeros by the engine.
    ///
    /// # Returns
    /// One `Gradient` per forward input, in input order. Each defined gradient
    /// must have the shape of the corresponding input.
    fn backward(&self, grad_outputs: &[Tensor]) -> Result<Vec<Gradient>, DygraphError>;
}

/// Shape and dtype of one output of a recorded operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputMeta {
    pub shape: Vec<usize>,
    pub dtype: DType,
}

/// One entry of the tape: an executed forward operation together with what is
/// needed to differentiate it.
///
/// Records are shared (`Arc`) by the tensors they produced. Input edges are
/// weak; the inputs are kept alive by the saved state, which `release` drops
/// together with the backward closure. After release the record can no longer
/// be differentiated and inputs nobody else holds are freed.
pub struct OperationRecord {
    seq: u64,
    name: &'static str,
    edges: Vec<Weak<RwLock<TensorData>>>,
    outputs: Vec<OutputMeta>,
    saved: RwLock<Option<SavedState>>,
}

struct SavedState {
    inputs: Vec<Tensor>,
    op: Box<dyn BackwardOp>,
}

impl OperationRecord {
    /// Execution-order sequence number. Later operations have larger values.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn num_inputs(&self) -> usize {
        self.edges.len()
    }

    /// The tensor on input edge `edge`, if it is still alive.
    pub fn input(&self, edge: usize) -> Option<Tensor> {
        self.edges.get(edge).and_then(Tensor::upgrade)
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn output_meta(&self, slot: usize) -> Option<&OutputMeta> {
        self.outputs.get(slot)
    }

    pub fn is_released(&self) -> bool {
        self.saved.read().map(|saved| saved.is_none()).unwrap_or(true)
    }

    /// Runs the backward closure and checks that it produced one gradient per input.
    pub(crate) fn run_backward(
        &self,
        grad_outputs: &[Tensor],
    ) -> Result<Vec<Gradient>, DygraphError> {
        let guard = self.saved.read().map_err(|_| {
            DygraphError::InternalError(format!("lock poisoned on record '{}'", self.name))
        })?;
        let saved = guard.as_ref().ok_or_else(|| DygraphError::GraphReleased {
            operation: self.name.to_string(),
        })?;
        let grads = saved.op.backward(grad_outputs)?;
        if grads.len() != saved.inputs.len() {
            return Err(DygraphError::InternalError(format!(
                "backward of '{}' returned {} gradients for {} inputs",
                self.name,
                grads.len(),
                saved.inputs.len()
            )));
        }
        Ok(grads)
    }

    /// Drops the saved backward state and the strong handles on the inputs.
    pub(crate) fn release(&self) {
        if let Ok(mut guard) = self.saved.write() {
            guard.take();
        }
    }
}

impl Debug for OperationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRecord")
            .field("seq", &self.seq)
            .field("name", &self.name)
            .field("num_inputs", &self.edges.len())
            .field("outputs", &self.outputs)
            .field("released", &self.is_released())
            .finish()
    }
}

/// Link from a produced tensor to the record that produced it.
#[derive(Clone)]
pub struct GradFn {
    record: Arc<OperationRecord>,
    slot: usize,
}

impl GradFn {
    pub fn name(&self) -> &'static str {
        self.record.name
    }

    /// Which output of the record this tensor is.
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn record(&self) -> &Arc<OperationRecord> {
        &self.record
    }
}

impl Debug for GradFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GradFn({}#{}, slot={})", self.record.name, self.record.seq, self.slot)
    }
}

/// True when an operation over `inputs` has to be recorded: grad mode is on and
/// at least one input takes part in differentiation.
pub fn needs_record(inputs: &[&Tensor]) -> bool {
    is_grad_enabled() && inputs.iter().any(|t| !t.read_data().stop_gradient)
}

/// Appends an operation to the tape and links `outputs` to it.
///
/// Outputs become non-leaf nodes with `stop_gradient = false`. Callers check
/// `needs_record` first; this function records unconditionally.
pub fn record_operation<B: BackwardOp + 'static>(
    name: &'static str,
    inputs: &[&Tensor],
    outputs: &[&Tensor],
    op: B,
) -> Arc<OperationRecord> {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let record = Arc::new(OperationRecord {
        seq: SEQ.fetch_add(1, Ordering::Relaxed),
        name,
        edges: inputs.iter().map(|t| t.downgrade()).collect(),
        outputs: outputs
            .iter()
            .map(|t| {
                let guard = t.read_data();
                OutputMeta {
                    shape: guard.shape.clone(),
                    dtype: guard.dtype(),
                }
            })
            .collect(),
        saved: RwLock::new(Some(SavedState {
            inputs: inputs.iter().map(|t| (*t).clone()).collect(),
            op: Box::new(op),
        })),
    });
    for (slot, output) in outputs.iter().enumerate() {
        let mut guard = output.write_data();
        guard.stop_gradient = false;
        guard.grad_fn = Some(GradFn {
            record: Arc::clone(&record),
            slot,
        });
    }
    log::trace!("recorded '{}' (seq {})", name, record.seq);
    record
}
