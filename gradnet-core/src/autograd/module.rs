use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, trace};

use crate::autograd::function::{Applied, Arg, Function, Returns};
use crate::autograd::graph::{ModuleId, Node};
use crate::autograd::variable::{read_storage, Variable, VariableStorage};
use crate::device::StorageDevice;
use crate::error::GradnetError;
use crate::value::Value;

/// Bookkeeping of the most recent application of a module.
///
/// `Function::forward` receives it mutably to save values for backward;
/// `Function::backward` reads them back together with the recorded inputs.
#[derive(Debug, Default)]
pub struct Context {
    inputs: Vec<Variable>,
    // Argument index of each recorded input.
    positions: Vec<usize>,
    // Output storage only: holding the output `Variable`s would make each
    // output own its producer and the producer own the output.
    outputs: Vec<VariableStorage>,
    saved: Vec<Value>,
}

impl Context {
    /// Variables passed to the current application, in argument order.
    pub fn inputs(&self) -> &[Variable] {
        &self.inputs
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Argument indices that were variables, in the order of [`Context::inputs`].
    pub fn input_positions(&self) -> &[usize] {
        &self.positions
    }

    /// True when argument `index` was a variable and is part of the graph.
    pub fn is_input(&self, index: usize) -> bool {
        self.positions.contains(&index)
    }

    /// Keeps the gradients of the arguments that were recorded as inputs.
    ///
    /// `per_argument` holds one gradient per argument of the application;
    /// the result lines up with [`Context::inputs`], as `Function::backward`
    /// must return it.
    pub fn input_grads(&self, per_argument: Vec<Value>) -> Vec<Value> {
        per_argument
            .into_iter()
            .enumerate()
            .filter(|(index, _)| self.is_input(*index))
            .map(|(_, grad)| grad)
            .collect()
    }

    /// True when every recorded input variable has `train = true`.
    pub fn train(&self) -> bool {
        self.inputs.iter().all(Variable::train)
    }

    /// Stores `values` for backward, only while [`Context::train`] holds.
    pub fn save_for_backward(&mut self, values: Vec<Value>) {
        if self.train() {
            self.saved = values;
        } else {
            trace!("Context: inference mode, {} values not saved", values.len());
        }
    }

    pub fn saved(&self) -> &[Value] {
        &self.saved
    }

    /// The saved value at `index`, or an error when nothing was saved there
    /// (for instance because forward ran in inference mode).
    pub fn saved_value(&self, index: usize) -> Result<&Value, GradnetError> {
        self.saved.get(index).ok_or_else(|| {
            GradnetError::InvalidArgument(format!(
                "no saved value at index {} ({} saved); was forward run with train inputs?",
                index,
                self.saved.len()
            ))
        })
    }
}

/// A [`Function`] wrapped with the graph bookkeeping of its latest application.
///
/// Modules are always handled through `Arc`: every output of [`Module::apply`]
/// holds the module as its producer. Applying a module again replaces the
/// recorded inputs, outputs and saved values, so one module instance
/// describes one node of the graph at a time.
pub struct Module<F: Function> {
    function: F,
    context: RwLock<Context>,
    submodules: RwLock<Vec<Arc<dyn Node>>>,
}

impl<F: Function> Module<F> {
    pub fn new(function: F) -> Arc<Self> {
        Arc::new(Module {
            function,
            context: RwLock::new(Context::default()),
            submodules: RwLock::new(Vec::new()),
        })
    }

    pub fn function(&self) -> &F {
        &self.function
    }

    fn read_context(&self) -> RwLockReadGuard<'_, Context> {
        self.context.read().expect("RwLock poisoned")
    }

    fn write_context(&self) -> RwLockWriteGuard<'_, Context> {
        self.context.write().expect("RwLock poisoned")
    }

    /// Runs the function's forward on `args` and wraps its results as
    /// variables produced by this module.
    ///
    /// Variable arguments are recorded as inputs; plain values are only
    /// passed through to the function.
    ///
    /// Applying a module to a variable computed from its own earlier output
    /// records that input without its producer, so backward treats it as a
    /// leaf. The module never ends up owning itself.
    pub fn apply<I, A>(self: &Arc<Self>, args: I) -> Result<Applied, GradnetError>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        // Only a module that already has outputs can sit upstream of its own arguments.
        let reapplied = self.num_outputs() > 0;
        let mut values = Vec::new();
        let mut inputs = Vec::new();
        let mut positions = Vec::new();
        for (index, arg) in args.into_iter().enumerate() {
            match arg.into() {
                Arg::Variable(variable) => {
                    values.push(variable.data());
                    positions.push(index);
                    if reapplied && variable.depends_on(self.id()) {
                        // Owning this input would own this module again.
                        trace!("{}: input {} recorded without its producer", self.function.name(), index);
                        inputs.push(variable.detached());
                    } else {
                        inputs.push(variable);
                    }
                }
                Arg::Value(value) => values.push(value),
            }
        }

        let mut ctx = self.write_context();
        ctx.inputs = inputs;
        ctx.positions = positions;
        ctx.outputs.clear();
        ctx.saved.clear();
        let returns = self.function.forward(&mut ctx, values)?;

        let train = ctx.train();
        let node: Arc<dyn Node> = self.clone();
        let wrap = |value: Value| Variable::from_output(value, train, Arc::clone(&node));
        let applied = match returns {
            Returns::Single(value) => Applied::Single(wrap(value)),
            Returns::Many(values) => Applied::Many(values.into_iter().map(wrap).collect()),
        };
        ctx.outputs = match &applied {
            Applied::Single(variable) => vec![variable.storage().clone()],
            Applied::Many(variables) => variables.iter().map(|v| v.storage().clone()).collect(),
        };

        debug!(
            "{}: applied to {} variables, {} outputs, train = {}",
            self.function.name(),
            ctx.inputs.len(),
            ctx.outputs.len(),
            train
        );
        Ok(applied)
    }

    /// [`Module::apply`] for single-output functions.
    pub fn call<I, A>(self: &Arc<Self>, args: I) -> Result<Variable, GradnetError>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.apply(args)?.single()
    }

    /// Output variables of the most recent application.
    pub fn outputs(self: &Arc<Self>) -> Vec<Variable> {
        let node: Arc<dyn Node> = self.clone();
        self.read_context()
            .outputs
            .iter()
            .map(|storage| Variable::from_storage(storage.clone(), Arc::clone(&node)))
            .collect()
    }

    /// Snapshot of the values saved by the most recent forward.
    pub fn saved(&self) -> Vec<Value> {
        self.read_context().saved.clone()
    }

    /// Argument indices of the recorded input variables.
    pub fn input_positions(&self) -> Vec<usize> {
        self.read_context().positions.clone()
    }

    /// Registers a child module so that `to_device` reaches it.
    pub fn add_submodule(&self, module: Arc<dyn Node>) {
        self.submodules.write().expect("RwLock poisoned").push(module);
    }
}

impl<F: Function> Node for Module<F> {
    fn id(&self) -> ModuleId {
        ModuleId(self as *const Self as *const () as usize)
    }

    fn name(&self) -> &'static str {
        self.function.name()
    }

    fn inputs(&self) -> Vec<Variable> {
        self.read_context().inputs.clone()
    }

    fn num_outputs(&self) -> usize {
        self.read_context().outputs.len()
    }

    fn sibling_grads(&self) -> Option<Vec<Value>> {
        let ctx = self.read_context();
        let mut grads = Vec::with_capacity(ctx.outputs.len());
        for output in &ctx.outputs {
            let grad = read_storage(output).grad.clone();
            if grad.is_empty() {
                return None;
            }
            grads.push(grad);
        }
        Some(grads)
    }

    fn backward(&self, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError> {
        let ctx = self.read_context();
        self.function.backward(&ctx, grad_outputs)
    }

    fn parameters(&self) -> Vec<Variable> {
        self.function.parameters()
    }

    fn submodules(&self) -> Vec<Arc<dyn Node>> {
        self.submodules.read().expect("RwLock poisoned").clone()
    }

    fn to_device(&self, device: StorageDevice) -> Result<(), GradnetError> {
        for parameter in self.function.parameters() {
            parameter.to_device(device)?;
        }
        {
            let mut ctx = self.write_context();
            for value in ctx.saved.iter_mut() {
                *value = value.to_device(device)?;
            }
        }
        for submodule in self.submodules() {
            submodule.to_device(device)?;
        }
        debug!("{}: moved to {:?}", self.function.name(), device);
        Ok(())
    }
}

impl<F: Function> fmt::Debug for Module<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.read_context();
        f.debug_struct("Module")
            .field("function", &self.function)
            .field("inputs", &ctx.inputs.len())
            .field("outputs", &ctx.outputs.len())
            .field("saved", &ctx.saved.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "module_test.rs"]
mod tests;
