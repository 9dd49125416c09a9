//! Operators carrying trainable parameters.

pub mod conv2d;
pub mod linear;

pub use conv2d::{Conv2d, Conv2dConfig};
pub use linear::Linear;
