// src/value/mod.rs

//! # Values
//!
//! `Value` is the dense numeric array the autograd graph carries around. It is
//! either *empty* (no data; used as "no gradient yet") or *defined*, in which
//! case it owns a flat row-major buffer, a shape and a device tag.
//!
//! Clones are cheap and behave like snapshots: the buffer is shared until one
//! side writes to it, at which point the writer gets its own copy.

use std::fmt;

use crate::buffer::Buffer;
use crate::device::StorageDevice;
use crate::error::GradnetError;
use crate::types::DType;

mod arithmetic;
mod compare;
pub mod create;
mod linalg;
mod reduction;

pub use compare::allclose;
pub use create::{full, ones, ones_like, rand, rand_with_rng, randn, randn_with_rng, zeros, zeros_like};

#[derive(Debug, Clone)]
struct Storage {
    buffer: Buffer,
    shape: Vec<usize>,
    device: StorageDevice,
}

/// An N-dimensional numeric array, or the empty sentinel.
#[derive(Clone, Default)]
pub struct Value {
    storage: Option<Storage>,
}

impl Value {
    /// The empty sentinel. Distinct from a zero-dimensional value.
    pub fn empty() -> Self {
        Value { storage: None }
    }

    /// Builds a CPU value from a buffer, checking that the element count matches `shape`.
    pub fn from_buffer(buffer: Buffer, shape: Vec<usize>) -> Result<Self, GradnetError> {
        let numel: usize = shape.iter().product();
        if buffer.len() != numel {
            return Err(GradnetError::TensorCreationError {
                data_len: buffer.len(),
                shape,
            });
        }
        Ok(Value {
            storage: Some(Storage {
                buffer,
                shape,
                device: StorageDevice::CPU,
            }),
        })
    }

    /// Creates a CPU F32 value from a `Vec<f32>` and shape.
    pub fn from_vec_f32(data: Vec<f32>, shape: Vec<usize>) -> Result<Self, GradnetError> {
        Self::from_buffer(Buffer::F32(data.into()), shape)
    }

    /// Creates a CPU F64 value from a `Vec<f64>` and shape.
    pub fn from_vec_f64(data: Vec<f64>, shape: Vec<usize>) -> Result<Self, GradnetError> {
        Self::from_buffer(Buffer::F64(data.into()), shape)
    }

    /// Creates a value of `dtype` from f64 elements, placed on `device`.
    pub fn from_f64_on(
        data: Vec<f64>,
        shape: Vec<usize>,
        dtype: DType,
        device: StorageDevice,
    ) -> Result<Self, GradnetError> {
        let mut value = Self::from_buffer(Buffer::from_f64(dtype, data), shape)?;
        if let Some(storage) = value.storage.as_mut() {
            storage.device = device;
        }
        Ok(value)
    }

    /// Zero-dimensional value holding `value`.
    pub fn scalar(value: f64, dtype: DType) -> Self {
        Value {
            storage: Some(Storage {
                buffer: Buffer::from_f64(dtype, vec![value]),
                shape: Vec::new(),
                device: StorageDevice::CPU,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_none()
    }

    pub fn is_defined(&self) -> bool {
        self.storage.is_some()
    }

    /// Shape of the value. An empty value reports no dimensions.
    pub fn shape(&self) -> &[usize] {
        match &self.storage {
            Some(storage) => &storage.shape,
            None => &[],
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Number of elements; zero for an empty value.
    pub fn numel(&self) -> usize {
        match &self.storage {
            Some(storage) => storage.buffer.len(),
            None => 0,
        }
    }

    pub fn dtype(&self) -> Option<DType> {
        self.storage.as_ref().map(|s| s.buffer.dtype())
    }

    pub fn device(&self) -> Option<StorageDevice> {
        self.storage.as_ref().map(|s| s.device)
    }

    /// Copies the elements out as f64, row-major.
    pub fn to_vec_f64(&self) -> Result<Vec<f64>, GradnetError> {
        Ok(self.defined("to_vec_f64")?.buffer.to_vec_f64())
    }

    /// Copies the elements out as f32. Fails for F64 values.
    pub fn to_vec_f32(&self) -> Result<Vec<f32>, GradnetError> {
        Ok(self.defined("to_vec_f32")?.buffer.try_get_f32()?.to_vec())
    }

    /// The single element of a one-element value.
    pub fn item(&self) -> Result<f64, GradnetError> {
        let storage = self.defined("item")?;
        if storage.buffer.len() != 1 {
            return Err(GradnetError::ShapeMismatch {
                expected: vec![],
                actual: storage.shape.clone(),
                operation: "item".to_string(),
            });
        }
        Ok(storage.buffer.to_vec_f64()[0])
    }

    /// Same elements viewed with another shape of equal element count.
    pub fn reshape(&self, shape: Vec<usize>) -> Result<Value, GradnetError> {
        let storage = self.defined("reshape")?;
        let numel: usize = shape.iter().product();
        if numel != storage.buffer.len() {
            return Err(GradnetError::ShapeMismatch {
                expected: storage.shape.clone(),
                actual: shape,
                operation: "reshape".to_string(),
            });
        }
        Ok(Value {
            storage: Some(Storage {
                buffer: storage.buffer.clone(),
                shape,
                device: storage.device,
            }),
        })
    }

    /// Returns this value bound to `device`.
    ///
    /// Transferring to the device the value already lives on returns an
    /// identical value; transferring an empty value yields an empty value.
    pub fn to_device(&self, device: StorageDevice) -> Result<Value, GradnetError> {
        match &self.storage {
            None => Ok(Value::empty()),
            Some(storage) if storage.device == device => Ok(self.clone()),
            Some(storage) => Ok(Value {
                storage: Some(Storage {
                    buffer: storage.buffer.clone(),
                    shape: storage.shape.clone(),
                    device,
                }),
            }),
        }
    }

    /// Up to `max_view` leading elements, flattened. Used for diagnostics.
    pub fn limit_view(&self, max_view: usize) -> Result<Vec<f64>, GradnetError> {
        let mut data = self.to_vec_f64()?;
        data.truncate(max_view);
        Ok(data)
    }

    fn defined(&self, operation: &str) -> Result<&Storage, GradnetError> {
        self.storage.as_ref().ok_or_else(|| GradnetError::EmptyValue {
            operation: operation.to_string(),
        })
    }

    fn with_buffer(&self, buffer: Buffer) -> Value {
        let (shape, device) = match &self.storage {
            Some(storage) => (storage.shape.clone(), storage.device),
            None => (Vec::new(), StorageDevice::CPU),
        };
        Value {
            storage: Some(Storage {
                buffer,
                shape,
                device,
            }),
        }
    }
}

const DISPLAY_LIMIT: usize = 20;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.storage {
            None => write!(f, "Value(empty)"),
            Some(storage) => {
                let data = storage.buffer.to_vec_f64();
                write!(
                    f,
                    "Value(shape={:?}, dtype={:?}, device={:?}, data={:?}",
                    storage.shape,
                    storage.buffer.dtype(),
                    storage.device,
                    &data[..data.len().min(DISPLAY_LIMIT)]
                )?;
                if data.len() > DISPLAY_LIMIT {
                    write!(f, " ... {} more", data.len() - DISPLAY_LIMIT)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;
