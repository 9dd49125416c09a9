// src/value/arithmetic.rs

use crate::error::GradnetError;
use crate::value::Value;

impl Value {
    /// Checks that `self` and `other` can be combined element by element:
    /// both defined, same device and same shape. DType is checked by the buffer.
    fn check_binary(&self, other: &Value, operation: &str) -> Result<(), GradnetError> {
        let lhs = self.defined(operation)?;
        let rhs = other.defined(operation)?;
        if lhs.device != rhs.device {
            return Err(GradnetError::DeviceMismatch {
                expected: lhs.device,
                actual: rhs.device,
                operation: operation.to_string(),
            });
        }
        if lhs.shape != rhs.shape {
            return Err(GradnetError::ShapeMismatch {
                expected: lhs.shape.clone(),
                actual: rhs.shape.clone(),
                operation: operation.to_string(),
            });
        }
        Ok(())
    }

    /// Element-wise combination of two same-shaped values.
    pub fn zip_map<F: Fn(f64, f64) -> f64>(
        &self,
        other: &Value,
        operation: &str,
        f: F,
    ) -> Result<Value, GradnetError> {
        self.check_binary(other, operation)?;
        let lhs = self.defined(operation)?;
        let rhs = other.defined(operation)?;
        let buffer = lhs.buffer.zip_map(&rhs.buffer, operation, f)?;
        Ok(self.with_buffer(buffer))
    }

    /// Applies `f` to every element.
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Result<Value, GradnetError> {
        let storage = self.defined("map")?;
        Ok(self.with_buffer(storage.buffer.map(f)))
    }

    pub fn add(&self, other: &Value) -> Result<Value, GradnetError> {
        self.zip_map(other, "add", |a, b| a + b)
    }

    pub fn sub(&self, other: &Value) -> Result<Value, GradnetError> {
        self.zip_map(other, "sub", |a, b| a - b)
    }

    pub fn mul(&self, other: &Value) -> Result<Value, GradnetError> {
        self.zip_map(other, "mul", |a, b| a * b)
    }

    pub fn div(&self, other: &Value) -> Result<Value, GradnetError> {
        self.zip_map(other, "div", |a, b| a / b)
    }

    pub fn neg(&self) -> Result<Value, GradnetError> {
        self.map(|x| -x)
    }

    pub fn abs(&self) -> Result<Value, GradnetError> {
        self.map(f64::abs)
    }

    pub fn add_scalar(&self, scalar: f64) -> Result<Value, GradnetError> {
        self.map(|x| x + scalar)
    }

    pub fn mul_scalar(&self, scalar: f64) -> Result<Value, GradnetError> {
        self.map(|x| x * scalar)
    }

    pub fn pow_scalar(&self, exponent: f64) -> Result<Value, GradnetError> {
        self.map(|x| x.powf(exponent))
    }

    /// `self += other`, element-wise. The storage is copied first when shared,
    /// so earlier clones of `self` keep their contents.
    pub fn add_assign(&mut self, other: &Value) -> Result<(), GradnetError> {
        self.check_binary(other, "add_assign")?;
        let rhs = other.defined("add_assign")?.buffer.clone();
        match self.storage.as_mut() {
            Some(storage) => storage.buffer.add_assign(&rhs),
            None => Err(GradnetError::EmptyValue {
                operation: "add_assign".to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "arithmetic_test.rs"]
mod tests;
