// src/value/create.rs

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::buffer::Buffer;
use crate::error::GradnetError;
use crate::types::DType;
use crate::value::Value;

/// Creates a CPU value of `dtype` filled with `value`.
pub fn full(shape: &[usize], value: f64, dtype: DType) -> Result<Value, GradnetError> {
    let numel = shape.iter().product();
    Value::from_buffer(Buffer::from_f64(dtype, vec![value; numel]), shape.to_vec())
}

/// Creates a CPU value filled with zeros.
pub fn zeros(shape: &[usize], dtype: DType) -> Result<Value, GradnetError> {
    full(shape, 0.0, dtype)
}

/// Creates a CPU value filled with ones.
pub fn ones(shape: &[usize], dtype: DType) -> Result<Value, GradnetError> {
    full(shape, 1.0, dtype)
}

/// Zeros with the shape, dtype and device of `value`.
pub fn zeros_like(value: &Value) -> Result<Value, GradnetError> {
    full_like(value, 0.0)
}

/// Ones with the shape, dtype and device of `value`.
pub fn ones_like(value: &Value) -> Result<Value, GradnetError> {
    full_like(value, 1.0)
}

fn full_like(value: &Value, fill: f64) -> Result<Value, GradnetError> {
    let (dtype, device) = match (value.dtype(), value.device()) {
        (Some(dtype), Some(device)) => (dtype, device),
        _ => {
            return Err(GradnetError::EmptyValue {
                operation: "full_like".to_string(),
            })
        }
    };
    full(value.shape(), fill, dtype)?.to_device(device)
}

/// Uniform samples in `[0, 1)` drawn from `rng`.
pub fn rand_with_rng<R: Rng + ?Sized>(
    rng: &mut R,
    shape: &[usize],
    dtype: DType,
) -> Result<Value, GradnetError> {
    let numel: usize = shape.iter().product();
    let data: Vec<f64> = (0..numel).map(|_| rng.gen::<f64>()).collect();
    Value::from_buffer(Buffer::from_f64(dtype, data), shape.to_vec())
}

/// Standard normal samples drawn from `rng`.
pub fn randn_with_rng<R: Rng + ?Sized>(
    rng: &mut R,
    shape: &[usize],
    dtype: DType,
) -> Result<Value, GradnetError> {
    let numel: usize = shape.iter().product();
    let data: Vec<f64> = (0..numel).map(|_| StandardNormal.sample(rng)).collect();
    Value::from_buffer(Buffer::from_f64(dtype, data), shape.to_vec())
}

// Note: rand and randn use the thread-local generator; pass an explicit rng
// through the *_with_rng variants when results must be reproducible.

pub fn rand(shape: &[usize], dtype: DType) -> Result<Value, GradnetError> {
    rand_with_rng(&mut rand::thread_rng(), shape, dtype)
}

pub fn randn(shape: &[usize], dtype: DType) -> Result<Value, GradnetError> {
    randn_with_rng(&mut rand::thread_rng(), shape, dtype)
}

#[cfg(test)]
#[path = "create_test.rs"]
mod tests;
