//! Checks shared by the operators before they touch raw elements.

use gradnet_core::{DType, GradnetError, StorageDevice, Value};

/// DType and device of a defined value.
pub(crate) fn layout(value: &Value, operation: &str) -> Result<(DType, StorageDevice), GradnetError> {
    match (value.dtype(), value.device()) {
        (Some(dtype), Some(device)) => Ok((dtype, device)),
        _ => Err(GradnetError::EmptyValue {
            operation: operation.to_string(),
        }),
    }
}

pub(crate) fn expect_rank(value: &Value, rank: usize, operation: &str) -> Result<(), GradnetError> {
    if value.ndim() != rank {
        return Err(GradnetError::DimensionMismatch {
            expected: rank,
            actual: value.ndim(),
            operation: operation.to_string(),
        });
    }
    Ok(())
}

/// Fails unless `a` and `b` share dtype and device.
pub(crate) fn expect_same_layout(a: &Value, b: &Value, operation: &str) -> Result<(DType, StorageDevice), GradnetError> {
    let (a_dtype, a_device) = layout(a, operation)?;
    let (b_dtype, b_device) = layout(b, operation)?;
    if a_device != b_device {
        return Err(GradnetError::DeviceMismatch {
            expected: a_device,
            actual: b_device,
            operation: operation.to_string(),
        });
    }
    if a_dtype != b_dtype {
        return Err(GradnetError::DTypeMismatch {
            expected: a_dtype,
            actual: b_dtype,
            operation: operation.to_string(),
        });
    }
    Ok((a_dtype, a_device))
}
