use std::fmt::Debug;
use std::sync::Arc;

use num_traits::{Float, NumAssignOps};

use crate::error::GradnetError;
use crate::types::DType;

/// Numeric element types usable inside a [`Buffer`].
///
/// Kernels that are written once and run for every dtype go through this
/// trait; `as_f64`/`from_f64_lossy` are the only conversions they rely on.
pub trait Element: Float + NumAssignOps + Debug + Copy + Send + Sync + 'static {
    const DTYPE: DType;

    fn as_f64(self) -> f64;

    /// Narrowing conversion (plain `as` cast for `f32`).
    fn from_f64_lossy(value: f64) -> Self;

    fn wrap(data: Vec<Self>) -> Buffer;
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    fn as_f64(self) -> f64 {
        self as f64
    }

    fn from_f64_lossy(value: f64) -> Self {
        value as f32
    }

    fn wrap(data: Vec<Self>) -> Buffer {
        Buffer::F32(Arc::new(data))
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    fn as_f64(self) -> f64 {
        self
    }

    fn from_f64_lossy(value: f64) -> Self {
        value
    }

    fn wrap(data: Vec<Self>) -> Buffer {
        Buffer::F64(Arc::new(data))
    }
}

/// Flat element storage of a defined `Value`.
///
/// The `Arc` makes clones cheap; writers go through `Arc::make_mut`, so a
/// buffer shared by several values is copied before it is modified.
#[derive(Debug, Clone)]
pub enum Buffer {
    F32(Arc<Vec<f32>>),
    F64(Arc<Vec<f64>>),
}

macro_rules! dispatch {
    ($buffer:expr, $data:ident => $body:expr) => {
        match $buffer {
            Buffer::F32($data) => $body,
            Buffer::F64($data) => $body,
        }
    };
}

impl Buffer {
    pub fn dtype(&self) -> DType {
        match self {
            Buffer::F32(_) => DType::F32,
            Buffer::F64(_) => DType::F64,
        }
    }

    pub fn len(&self) -> usize {
        dispatch!(self, data => data.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds a buffer of `dtype` from f64 elements, narrowing when needed.
    pub fn from_f64(dtype: DType, data: Vec<f64>) -> Buffer {
        match dtype {
            DType::F32 => f32::wrap(data.into_iter().map(f32::from_f64_lossy).collect()),
            DType::F64 => f64::wrap(data),
        }
    }

    pub fn to_vec_f64(&self) -> Vec<f64> {
        dispatch!(self, data => data.iter().map(|&x| x.as_f64()).collect())
    }

    /// Attempts to get the underlying `Arc<Vec<f32>>`.
    pub fn try_get_f32(&self) -> Result<&Arc<Vec<f32>>, GradnetError> {
        match self {
            Buffer::F32(data) => Ok(data),
            other => Err(GradnetError::DTypeMismatch {
                expected: DType::F32,
                actual: other.dtype(),
                operation: "try_get_f32".to_string(),
            }),
        }
    }

    /// Attempts to get the underlying `Arc<Vec<f64>>`.
    pub fn try_get_f64(&self) -> Result<&Arc<Vec<f64>>, GradnetError> {
        match self {
            Buffer::F64(data) => Ok(data),
            other => Err(GradnetError::DTypeMismatch {
                expected: DType::F64,
                actual: other.dtype(),
                operation: "try_get_f64".to_string(),
            }),
        }
    }

    /// Applies `f` to every element, keeping the dtype.
    pub(crate) fn map<F: Fn(f64) -> f64>(&self, f: F) -> Buffer {
        dispatch!(self, data => map_slice(data.as_slice(), &f))
    }

    /// Combines two buffers of the same dtype and length element by element.
    pub(crate) fn zip_map<F: Fn(f64, f64) -> f64>(
        &self,
        other: &Buffer,
        operation: &str,
        f: F,
    ) -> Result<Buffer, GradnetError> {
        match (self, other) {
            (Buffer::F32(a), Buffer::F32(b)) => Ok(zip_slices(a.as_slice(), b.as_slice(), &f)),
            (Buffer::F64(a), Buffer::F64(b)) => Ok(zip_slices(a.as_slice(), b.as_slice(), &f)),
            (a, b) => Err(GradnetError::DTypeMismatch {
                expected: a.dtype(),
                actual: b.dtype(),
                operation: operation.to_string(),
            }),
        }
    }

    /// In-place element-wise addition. Copies the storage first if it is shared.
    pub(crate) fn add_assign(&mut self, other: &Buffer) -> Result<(), GradnetError> {
        match (self, other) {
            (Buffer::F32(a), Buffer::F32(b)) => add_assign_slices(Arc::make_mut(a).as_mut_slice(), b),
            (Buffer::F64(a), Buffer::F64(b)) => add_assign_slices(Arc::make_mut(a).as_mut_slice(), b),
            (a, b) => {
                return Err(GradnetError::DTypeMismatch {
                    expected: a.dtype(),
                    actual: b.dtype(),
                    operation: "add_assign".to_string(),
                })
            }
        }
        Ok(())
    }
}

fn map_slice<T: Element, F: Fn(f64) -> f64>(data: &[T], f: &F) -> Buffer {
    T::wrap(
        data.iter()
            .map(|&x| T::from_f64_lossy(f(x.as_f64())))
            .collect(),
    )
}

fn zip_slices<T: Element, F: Fn(f64, f64) -> f64>(a: &[T], b: &[T], f: &F) -> Buffer {
    T::wrap(
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| T::from_f64_lossy(f(x.as_f64(), y.as_f64())))
            .collect(),
    )
}

fn add_assign_slices<T: Element>(a: &mut [T], b: &[T]) {
    for (x, &y) in a.iter_mut().zip(b.iter()) {
        *x += y;
    }
}
