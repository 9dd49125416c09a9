use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{trace, warn};

use crate::autograd::graph::{ModuleId, Node};
use crate::device::StorageDevice;
use crate::error::GradnetError;
use crate::types::DType;
use crate::value::Value;

/// State shared by every handle to the same variable.
#[derive(Debug, Default)]
pub(crate) struct VariableData {
    pub(crate) data: Value,
    pub(crate) grad: Value,
    pub(crate) train: bool,
}

pub(crate) type VariableStorage = Arc<RwLock<VariableData>>;

pub(crate) fn read_storage(storage: &VariableStorage) -> RwLockReadGuard<'_, VariableData> {
    storage.read().expect("RwLock poisoned")
}

pub(crate) fn write_storage(storage: &VariableStorage) -> RwLockWriteGuard<'_, VariableData> {
    storage.write().expect("RwLock poisoned")
}

/// Identity of a variable. Two handles compare equal iff they share storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(usize);

/// Set of variables keyed by identity.
pub type VariableSet = HashSet<VariableId>;

/// Map from variable identity to `V`.
pub type VariableMap<V> = HashMap<VariableId, V>;

/// A node of the computation graph: a value, its accumulated gradient, a
/// train flag and, for non-leaf variables, the module application that
/// produced it.
///
/// Cloning a `Variable` yields another handle to the same node, so gradients
/// accumulated through one handle are visible through all others.
#[derive(Clone)]
pub struct Variable {
    storage: VariableStorage,
    producer: Option<Arc<dyn Node>>,
}

impl Variable {
    /// Creates a leaf variable with `train = true`.
    pub fn new(data: Value) -> Self {
        Self::with_train(data, true)
    }

    /// Creates a leaf variable with an explicit train flag.
    pub fn with_train(data: Value, train: bool) -> Self {
        Variable {
            storage: Arc::new(RwLock::new(VariableData {
                data,
                grad: Value::empty(),
                train,
            })),
            producer: None,
        }
    }

    /// Output `data` of a module application.
    pub(crate) fn from_output(data: Value, train: bool, producer: Arc<dyn Node>) -> Self {
        let mut variable = Self::with_train(data, train);
        variable.producer = Some(producer);
        variable
    }

    /// Another handle to an existing output of `producer`.
    pub(crate) fn from_storage(storage: VariableStorage, producer: Arc<dyn Node>) -> Self {
        Variable {
            storage,
            producer: Some(producer),
        }
    }

    /// Handle to the same storage with no producer edge.
    pub(crate) fn detached(&self) -> Self {
        Variable {
            storage: self.storage.clone(),
            producer: None,
        }
    }

    /// True when `module` produced this variable or anything upstream of it.
    pub(crate) fn depends_on(&self, module: ModuleId) -> bool {
        let mut visited = HashSet::new();
        let mut pending: Vec<Arc<dyn Node>> = self.producer.iter().cloned().collect();
        while let Some(node) = pending.pop() {
            if node.id() == module {
                return true;
            }
            if visited.insert(node.id()) {
                pending.extend(node.inputs().iter().filter_map(Variable::producer));
            }
        }
        false
    }

    pub(crate) fn storage(&self) -> &VariableStorage {
        &self.storage
    }

    fn read(&self) -> RwLockReadGuard<'_, VariableData> {
        read_storage(&self.storage)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VariableData> {
        write_storage(&self.storage)
    }

    /// Snapshot of the data.
    pub fn data(&self) -> Value {
        self.read().data.clone()
    }

    /// Snapshot of the accumulated gradient; empty until something is accumulated.
    pub fn grad(&self) -> Value {
        self.read().grad.clone()
    }

    pub fn train(&self) -> bool {
        self.read().train
    }

    pub fn set_train(&self, train: bool) {
        self.write().train = train;
    }

    /// Replaces the data in place. The new value must keep the same shape.
    pub fn set_data(&self, data: Value) -> Result<(), GradnetError> {
        let mut guard = self.write();
        if !data.shape_eq(&guard.data) {
            return Err(GradnetError::ShapeMismatch {
                expected: guard.data.shape().to_vec(),
                actual: data.shape().to_vec(),
                operation: "set_data".to_string(),
            });
        }
        guard.data = data;
        Ok(())
    }

    pub fn shape(&self) -> Vec<usize> {
        self.read().data.shape().to_vec()
    }

    pub fn dtype(&self) -> Option<DType> {
        self.read().data.dtype()
    }

    pub fn device(&self) -> Option<StorageDevice> {
        self.read().data.device()
    }

    pub fn id(&self) -> VariableId {
        VariableId(Arc::as_ptr(&self.storage) as *const () as usize)
    }

    /// True when both handles refer to the same variable.
    pub fn ptr_eq(&self, other: &Variable) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// A variable is a leaf when it was not produced by a module.
    pub fn is_leaf(&self) -> bool {
        self.producer.is_none()
    }

    pub fn producer(&self) -> Option<Arc<dyn Node>> {
        self.producer.clone()
    }

    /// Adds `grad` into the accumulated gradient.
    ///
    /// The first contribution is stored as is (a snapshot, later writes to the
    /// caller's value do not leak in); later ones are summed element-wise.
    ///
    /// # Panics
    /// If `grad` is empty or its shape differs from the data's shape.
    pub fn accumulate_grad(&self, grad: &Value) -> Result<(), GradnetError> {
        assert!(grad.is_defined(), "Cannot accumulate an empty gradient");
        let mut guard = self.write();
        assert!(
            grad.shape_eq(&guard.data),
            "Gradient shape {:?} does not match variable shape {:?}",
            grad.shape(),
            guard.data.shape()
        );
        if guard.grad.is_empty() {
            guard.grad = grad.clone();
            Ok(())
        } else {
            guard.grad.add_assign(grad)
        }
    }

    /// Seeds this variable with `grad` and propagates it through the graph.
    ///
    /// A module's backward runs once the gradients of all of its outputs are
    /// defined; until then the contribution just waits in the output's grad.
    /// An output that never receives a gradient keeps its producer from firing.
    pub fn backward(&self, grad: Value) -> Result<(), GradnetError> {
        if !self.train() {
            warn!("Variable::backward seeded on a variable with train = false");
        }
        self.propagate(grad)
    }

    fn propagate(&self, grad: Value) -> Result<(), GradnetError> {
        self.accumulate_grad(&grad)?;

        let producer = match &self.producer {
            Some(producer) => producer,
            None => {
                trace!("Variable::backward: reached leaf {:?}", self.id());
                return Ok(());
            }
        };

        let grad_outputs = match producer.sibling_grads() {
            Some(grads) => grads,
            None => {
                trace!(
                    "Variable::backward: {} waits for sibling gradients",
                    producer.name()
                );
                return Ok(());
            }
        };

        trace!("Variable::backward: running {} backward", producer.name());
        let grad_inputs = producer.backward(grad_outputs)?;
        let inputs = producer.inputs();
        assert_eq!(
            grad_inputs.len(),
            inputs.len(),
            "{} backward returned {} gradients for {} inputs",
            producer.name(),
            grad_inputs.len(),
            inputs.len()
        );

        for (input, grad) in inputs.iter().zip(grad_inputs) {
            input.propagate(grad)?;
        }
        Ok(())
    }

    /// Empties the gradient of this variable and of every variable upstream of it.
    pub fn clear_grads(&self) {
        let mut visited = HashSet::new();
        self.clear_grads_from(&mut visited);
    }

    fn clear_grads_from(&self, visited: &mut HashSet<ModuleId>) {
        self.write().grad = Value::empty();
        if let Some(producer) = &self.producer {
            if visited.insert(producer.id()) {
                for input in producer.inputs() {
                    input.clear_grads_from(visited);
                }
            }
        }
    }

    /// Moves data and, when defined, the gradient to `device`.
    pub fn to_device(&self, device: StorageDevice) -> Result<(), GradnetError> {
        let mut guard = self.write();
        guard.data = guard.data.to_device(device)?;
        if guard.grad.is_defined() {
            guard.grad = guard.grad.to_device(device)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.read();
        f.debug_struct("Variable")
            .field("id", &self.id())
            .field("shape", &guard.data.shape())
            .field("train", &guard.train)
            .field("has_grad", &guard.grad.is_defined())
            .field("producer", &self.producer.as_ref().map(|p| p.name()))
            .finish()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.read();
        write!(f, "Variable(data={}, grad={})", guard.data, guard.grad)
    }
}

#[cfg(test)]
#[path = "variable_test.rs"]
mod tests;
