//! Concrete operators for GradNet.
//!
//! Every operator here is a [`Function`](gradnet_core::Function): wrap it in a
//! [`Module`](gradnet_core::Module) and call it on variables.
//!
//! ```ignore
//! let relu = Module::new(gradnet_nn::relu());
//! let y = relu.call([&x])?;
//! ```

pub mod functions;
pub mod init;
mod kernel;
pub mod layers;

pub use functions::{relu, Add, Mul, Pow, Split, Threshold};
pub use layers::{Conv2d, Conv2dConfig, Linear};
