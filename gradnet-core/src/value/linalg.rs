// src/value/linalg.rs

use crate::buffer::Buffer;
use crate::error::GradnetError;
use crate::value::{Storage, Value};

impl Value {
    fn check_rank2(&self, operation: &str) -> Result<(usize, usize), GradnetError> {
        let storage = self.defined(operation)?;
        if storage.shape.len() != 2 {
            return Err(GradnetError::DimensionMismatch {
                expected: 2,
                actual: storage.shape.len(),
                operation: operation.to_string(),
            });
        }
        Ok((storage.shape[0], storage.shape[1]))
    }

    /// Matrix product of two 2-D values: `[m, k] x [k, n] -> [m, n]`.
    pub fn matmul(&self, other: &Value) -> Result<Value, GradnetError> {
        let (m, k) = self.check_rank2("matmul")?;
        let (k2, n) = other.check_rank2("matmul")?;
        let lhs = self.defined("matmul")?;
        let rhs = other.defined("matmul")?;
        if k != k2 {
            return Err(GradnetError::ShapeMismatch {
                expected: vec![k, n],
                actual: rhs.shape.clone(),
                operation: "matmul".to_string(),
            });
        }
        if lhs.device != rhs.device {
            return Err(GradnetError::DeviceMismatch {
                expected: lhs.device,
                actual: rhs.device,
                operation: "matmul".to_string(),
            });
        }
        if lhs.buffer.dtype() != rhs.buffer.dtype() {
            return Err(GradnetError::DTypeMismatch {
                expected: lhs.buffer.dtype(),
                actual: rhs.buffer.dtype(),
                operation: "matmul".to_string(),
            });
        }

        let a = lhs.buffer.to_vec_f64();
        let b = rhs.buffer.to_vec_f64();
        let mut out = vec![0.0; m * n];
        for i in 0..m {
            for p in 0..k {
                let a_ip = a[i * k + p];
                for j in 0..n {
                    out[i * n + j] += a_ip * b[p * n + j];
                }
            }
        }
        Ok(Value {
            storage: Some(Storage {
                buffer: Buffer::from_f64(lhs.buffer.dtype(), out),
                shape: vec![m, n],
                device: lhs.device,
            }),
        })
    }

    /// Transpose of a 2-D value (materialised, not a view).
    pub fn transpose(&self) -> Result<Value, GradnetError> {
        let (rows, cols) = self.check_rank2("transpose")?;
        let storage = self.defined("transpose")?;
        let data = storage.buffer.to_vec_f64();
        let mut out = vec![0.0; rows * cols];
        for r in 0..rows {
            for c in 0..cols {
                out[c * rows + r] = data[r * cols + c];
            }
        }
        Ok(Value {
            storage: Some(Storage {
                buffer: Buffer::from_f64(storage.buffer.dtype(), out),
                shape: vec![cols, rows],
                device: storage.device,
            }),
        })
    }
}

#[cfg(test)]
#[path = "linalg_test.rs"]
mod tests;
