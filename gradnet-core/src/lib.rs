//! GradNet core: a reverse-mode autograd engine over dynamically built graphs.
//!
//! The crate provides the [`Value`] array type the graph carries, the graph
//! itself ([`Variable`], [`Module`], the [`Function`] contract) and a
//! finite-difference gradient checker. Concrete operators live in
//! `gradnet-nn`.

pub mod autograd;
pub mod buffer;
pub mod device;
pub mod error;
pub mod types;
pub mod utils;
pub mod value;

pub use autograd::{Applied, Arg, Context, Function, Module, ModuleId, Node, Returns, Variable, VariableId};
pub use device::StorageDevice;
pub use error::GradnetError;
pub use types::DType;
pub use value::Value;

// Re-export traits required by public functions/structs
pub use num_traits;
