// src/value/reduction.rs

use crate::buffer::Buffer;
use crate::error::GradnetError;
use crate::value::{Storage, Value};

impl Value {
    /// Sum of all elements as a zero-dimensional value.
    pub fn sum(&self) -> Result<Value, GradnetError> {
        let storage = self.defined("sum")?;
        let total: f64 = storage.buffer.to_vec_f64().iter().sum();
        Ok(Value {
            storage: Some(Storage {
                buffer: Buffer::from_f64(storage.buffer.dtype(), vec![total]),
                shape: Vec::new(),
                device: storage.device,
            }),
        })
    }

    /// Sums over dimension `dim`, removing it from the shape.
    pub fn sum_dim(&self, dim: usize) -> Result<Value, GradnetError> {
        let storage = self.defined("sum_dim")?;
        let shape = &storage.shape;
        if dim >= shape.len() {
            return Err(GradnetError::DimensionMismatch {
                expected: shape.len(),
                actual: dim,
                operation: "sum_dim".to_string(),
            });
        }
        let outer: usize = shape[..dim].iter().product();
        let reduced = shape[dim];
        let inner: usize = shape[dim + 1..].iter().product();

        let data = storage.buffer.to_vec_f64();
        let mut out = vec![0.0; outer * inner];
        for o in 0..outer {
            for r in 0..reduced {
                let base = (o * reduced + r) * inner;
                for i in 0..inner {
                    out[o * inner + i] += data[base + i];
                }
            }
        }

        let mut out_shape = shape.clone();
        out_shape.remove(dim);
        Ok(Value {
            storage: Some(Storage {
                buffer: Buffer::from_f64(storage.buffer.dtype(), out),
                shape: out_shape,
                device: storage.device,
            }),
        })
    }
}
