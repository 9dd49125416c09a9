use crate::device::StorageDevice;
use crate::types::DType;
use thiserror::Error;

/// Error type for fallible value and operator work in GradNet.
///
/// Contract violations inside the backward engine (a gradient whose shape does
/// not match the variable it is accumulated into, or a `Function::backward`
/// returning the wrong number of gradients) are assertions and never surface
/// through this type.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum GradnetError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual} during operation {operation}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        operation: String,
    },

    #[error("Value creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Device mismatch for operation '{operation}': expected {expected:?}, got {actual:?}")]
    DeviceMismatch {
        expected: StorageDevice,
        actual: StorageDevice,
        operation: String,
    },

    #[error("DType mismatch for operation '{operation}': expected {expected:?}, got {actual:?}")]
    DTypeMismatch {
        expected: DType,
        actual: DType,
        operation: String,
    },

    #[error("Operation '{operation}' needs a defined value, got an empty one")]
    EmptyValue { operation: String },

    #[error("Function '{function}' expects {expected} inputs, got {actual}")]
    ArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("Expected a single output, module produced {count}")]
    NotSingleOutput { count: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
