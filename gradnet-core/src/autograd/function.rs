use std::fmt::Debug;

use crate::autograd::module::Context;
use crate::autograd::variable::Variable;
use crate::error::GradnetError;
use crate::value::Value;

/// Defines the forward/backward pair a concrete operator plugs into a [`Module`].
///
/// A `Function` works on plain [`Value`]s only: it never builds or inspects
/// [`Variable`]s for its inputs or outputs, the owning `Module` does that
/// bookkeeping. Its fields are the operator's configuration (an exponent, a
/// kernel size, ...) and, for stateful operators, its parameter `Variable`s.
///
/// [`Module`]: crate::autograd::Module
pub trait Function: Debug + Send + Sync + 'static {
    /// Human readable operator name, used in logs and error messages.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Computes the outputs of the operator.
    ///
    /// `inputs` holds one value per argument given to `Module::apply`, in
    /// argument order (variables already unwrapped). Values needed later by
    /// `backward` are stored with [`Context::save_for_backward`].
    fn forward(&self, ctx: &mut Context, inputs: Vec<Value>) -> Result<Returns, GradnetError>;

    /// Computes one gradient per recorded input variable.
    ///
    /// `grad_outputs` holds the gradient of every output, in output order.
    /// The returned `Vec` **must** line up with `ctx.inputs()`; the engine
    /// asserts on its length. When some arguments may be plain values,
    /// compute one gradient per argument and pass them through
    /// [`Context::input_grads`]. Gradients of parameters that are not positional
    /// inputs are accumulated directly with [`Variable::accumulate_grad`].
    fn backward(&self, ctx: &Context, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError>;

    /// Learned state owned by this operator.
    fn parameters(&self) -> Vec<Variable> {
        Vec::new()
    }
}

/// What a [`Function::forward`] produced: one value or an ordered list.
#[derive(Debug, Clone)]
pub enum Returns {
    Single(Value),
    Many(Vec<Value>),
}

impl Returns {
    pub fn len(&self) -> usize {
        match self {
            Returns::Single(_) => 1,
            Returns::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Value> for Returns {
    fn from(value: Value) -> Self {
        Returns::Single(value)
    }
}

impl From<Vec<Value>> for Returns {
    fn from(values: Vec<Value>) -> Self {
        Returns::Many(values)
    }
}

/// One argument to `Module::apply`.
///
/// Variables are recorded as graph inputs; plain values go to the function
/// untouched and take no part in backward.
#[derive(Debug, Clone)]
pub enum Arg {
    Variable(Variable),
    Value(Value),
}

impl From<Variable> for Arg {
    fn from(variable: Variable) -> Self {
        Arg::Variable(variable)
    }
}

impl From<&Variable> for Arg {
    fn from(variable: &Variable) -> Self {
        Arg::Variable(variable.clone())
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<&Value> for Arg {
    fn from(value: &Value) -> Self {
        Arg::Value(value.clone())
    }
}

/// Variables returned by `Module::apply`, mirroring [`Returns`].
#[derive(Debug, Clone)]
pub enum Applied {
    Single(Variable),
    Many(Vec<Variable>),
}

impl Applied {
    /// The output of a single-output application.
    pub fn single(self) -> Result<Variable, GradnetError> {
        match self {
            Applied::Single(variable) => Ok(variable),
            Applied::Many(variables) => Err(GradnetError::NotSingleOutput {
                count: variables.len(),
            }),
        }
    }

    pub fn into_vec(self) -> Vec<Variable> {
        match self {
            Applied::Single(variable) => vec![variable],
            Applied::Many(variables) => variables,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Applied::Single(_) => 1,
            Applied::Many(variables) => variables.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Checks that `inputs` has exactly `expected` entries.
pub fn expect_arity<T>(function: &str, inputs: &[T], expected: usize) -> Result<(), GradnetError> {
    if inputs.len() != expected {
        return Err(GradnetError::ArityMismatch {
            function: function.to_string(),
            expected,
            actual: inputs.len(),
        });
    }
    Ok(())
}
