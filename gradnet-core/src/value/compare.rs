// src/value/compare.rs

use crate::error::GradnetError;
use crate::value::Value;

/// Element-wise closeness: `|actual - desired| <= |desired| * rtol + atol` everywhere.
///
/// Both values must be defined and share shape, dtype and device.
pub fn allclose(actual: &Value, desired: &Value, rtol: f64, atol: f64) -> Result<bool, GradnetError> {
    let close = actual.zip_map(desired, "allclose", |a, d| {
        if (a - d).abs() <= d.abs() * rtol + atol {
            1.0
        } else {
            0.0
        }
    })?;
    Ok(close.to_vec_f64()?.iter().all(|&flag| flag == 1.0))
}

impl Value {
    /// True when both values have the same shape. Empty values only match each other.
    pub fn shape_eq(&self, other: &Value) -> bool {
        self.is_defined() == other.is_defined() && self.shape() == other.shape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DType;
    use crate::value::{full, zeros};

    #[test]
    fn test_allclose_tolerances() {
        let desired = full(&[3], 100.0, DType::F64).unwrap();
        let actual = full(&[3], 100.05, DType::F64).unwrap();
        assert!(!allclose(&actual, &desired, 1e-7, 0.0).unwrap());
        assert!(allclose(&actual, &desired, 1e-3, 0.0).unwrap());
        assert!(allclose(&actual, &desired, 0.0, 0.1).unwrap());
    }

    #[test]
    fn test_allclose_requires_defined_values() {
        let v = zeros(&[2], DType::F32).unwrap();
        let err = allclose(&Value::empty(), &v, 1e-5, 1e-8).unwrap_err();
        assert!(matches!(err, GradnetError::EmptyValue { .. }));
    }

    #[test]
    fn test_shape_eq() {
        let a = zeros(&[2, 3], DType::F32).unwrap();
        let b = zeros(&[2, 3], DType::F64).unwrap();
        let c = zeros(&[3, 2], DType::F32).unwrap();
        assert!(a.shape_eq(&b));
        assert!(!a.shape_eq(&c));
        assert!(!Value::scalar(1.0, DType::F32).shape_eq(&Value::empty()));
        assert!(Value::empty().shape_eq(&Value::empty()));
    }
}
