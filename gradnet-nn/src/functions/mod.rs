//! Stateless operators. Wrap one in `Module::new` to use it in a graph.

pub mod add;
pub mod mul;
pub mod pow;
pub mod split;
pub mod threshold;

pub use add::Add;
pub use mul::Mul;
pub use pow::Pow;
pub use split::Split;
pub use threshold::{relu, Threshold};
