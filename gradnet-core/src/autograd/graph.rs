use std::fmt::Debug;

use crate::autograd::variable::Variable;
use crate::device::StorageDevice;
use crate::error::GradnetError;
use crate::value::Value;

/// Stable identity of a module node, derived from its heap address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) usize);

/// Type-erased view of a `Module` as a node of the computation graph.
///
/// Variables hold their producer through `Arc<dyn Node>`, which lets the
/// backward engine walk a graph mixing modules of every function type.
pub trait Node: Debug + Send + Sync {
    fn id(&self) -> ModuleId;

    fn name(&self) -> &'static str;

    /// Variables recorded by the most recent application.
    fn inputs(&self) -> Vec<Variable>;

    /// Number of outputs produced by the most recent application.
    fn num_outputs(&self) -> usize;

    /// Gradients of all outputs in output order, or `None` while any of them
    /// is still empty.
    fn sibling_grads(&self) -> Option<Vec<Value>>;

    /// Runs the function's backward with the recorded context.
    fn backward(&self, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError>;

    fn parameters(&self) -> Vec<Variable>;

    fn submodules(&self) -> Vec<std::sync::Arc<dyn Node>>;

    /// Moves parameters, saved values and submodules to `device`.
    fn to_device(&self, device: StorageDevice) -> Result<(), GradnetError>;
}
