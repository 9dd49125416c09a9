//! # Autograd
//!
//! Reverse-mode differentiation over a graph of [`Variable`]s and [`Module`]s.
//!
//! A [`Function`] supplies the value-level forward and backward of an operator.
//! Wrapping it in a [`Module`] and calling [`Module::apply`] records the
//! application: the argument variables become the module's inputs and every
//! result comes back as a `Variable` whose producer is the module.
//!
//! [`Variable::backward`] seeds a gradient and walks the graph towards the
//! leaves. A multi-output module only runs its backward once every one of its
//! outputs holds a gradient; until then contributions are parked on the
//! outputs themselves.

pub mod function;
pub mod grad_check;
pub mod graph;
pub mod module;
pub mod variable;

pub use function::{expect_arity, Applied, Arg, Function, Returns};
pub use grad_check::{check_grad, numeric_grad, GradCheckConfig, GradCheckError};
pub use graph::{ModuleId, Node};
pub use module::{Context, Module};
pub use variable::{Variable, VariableId, VariableMap, VariableSet};

#[cfg(test)]
pub(crate) mod test_functions;
