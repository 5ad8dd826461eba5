//! Core Tensor implementation.
//!
//! This module defines the `Tensor` struct, the numeric substrate the
//! `autograd` module differentiates over. It is an owned N-dimensional array
//! with a single CPU backend.
//!
//! # Key Components
//!
//! - [`Tensor`]: the main struct representing an N-dimensional array.
//! - [`TensorError`]: error type for tensor and graph operations.
//! - [`TensorElem`]: trait bound for elements that can be stored in a tensor.
//!
//! # Examples
//!
//! ```rust
//! use revgrad::tensor::Tensor;
//!
//! let data = vec![1.0, 2.0, 3.0, 4.0];
//! let tensor = Tensor::<f32, 2>::new(data, [2, 2]).unwrap();
//! assert_eq!(tensor.shape(), &[2, 2]);
//! ```

use num_traits::{FromPrimitive, Num, NumAssign, ToPrimitive};
use std::fmt::Debug;
use thiserror::Error;

pub mod ops;

pub use ops::Gemm;

/// Error type for tensor and computation-graph operations.
#[derive(Error, Debug)]
pub enum TensorError {
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    #[error("Operation `{op}` expects {expected} operand(s), got {got}")]
    Arity {
        op: &'static str,
        expected: usize,
        got: usize,
    },
}

pub type Result<T> = std::result::Result<T, TensorError>;

/// Trait bound for elements that can be stored in a Tensor.
///
/// # Requirements
/// - `Copy`: essential for efficient storage in contiguous memory and fast
///   element access.
/// - `Num + ...`: provides necessary numeric operations for tensor math.
/// - `Send + Sync`: required for parallel execution via `rayon`.
/// - `'static`: elements are plain scalars; this keeps trait objects over
///   them free of lifetime plumbing.
pub trait TensorElem:
    Num
    + NumAssign
    + Copy
    + Debug
    + Send
    + Sync
    + FromPrimitive
    + ToPrimitive
    + PartialOrd
    + 'static
{
}

impl<T> TensorElem for T where
    T: Num
        + NumAssign
        + Copy
        + Debug
        + Send
        + Sync
        + FromPrimitive
        + ToPrimitive
        + PartialOrd
        + 'static
{
}

/// The core Tensor struct.
///
/// Represents an N-dimensional array of elements in row-major order.
///
/// # Generics
///
/// - `T`: the element type (must implement `TensorElem`).
/// - `RANK`: the number of dimensions (const generic). `RANK = 0` is a
///   scalar holding exactly one element.
#[derive(Clone)]
pub struct Tensor<T, const RANK: usize>
where
    T: TensorElem,
{
    shape: [usize; RANK],
    strides: [usize; RANK],
    data: Vec<T>,
}

impl<T, const RANK: usize> Tensor<T, RANK>
where
    T: TensorElem,
{
    /// Creates a new Tensor from a flat vector of data and a shape.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if the length of `data` does not
    /// match the product of `shape`.
    pub fn new(data: Vec<T>, shape: [usize; RANK]) -> Result<Self> {
        let size: usize = shape.iter().product();
        if data.len() != size {
            return Err(TensorError::ShapeMismatch {
                expected: vec![size],
                got: vec![data.len()],
            });
        }

        let strides = compute_strides(&shape);
        Ok(Self {
            shape,
            strides,
            data,
        })
    }

    /// Creates a new Tensor filled with zeros.
    pub fn zeros(shape: [usize; RANK]) -> Self {
        let size: usize = shape.iter().product();
        Self {
            shape,
            strides: compute_strides(&shape),
            data: vec![T::zero(); size],
        }
    }

    /// Creates a new Tensor filled with ones.
    pub fn ones(shape: [usize; RANK]) -> Self {
        let size: usize = shape.iter().product();
        Self {
            shape,
            strides: compute_strides(&shape),
            data: vec![T::one(); size],
        }
    }

    /// Returns the shape of the tensor.
    pub fn shape(&self) -> &[usize; RANK] {
        &self.shape
    }

    /// Returns the row-major strides of the tensor.
    pub fn strides(&self) -> &[usize; RANK] {
        &self.strides
    }

    /// Returns a reference to the underlying data as a slice.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns a mutable reference to the underlying data as a slice.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Returns the total number of elements in the tensor.
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Computes the strides for a given shape.
///
/// Strides represent the number of elements to skip in memory to move to the
/// next element along a specific dimension, assuming a row-major (C-style)
/// memory layout.
fn compute_strides<const RANK: usize>(shape: &[usize; RANK]) -> [usize; RANK] {
    let mut strides = [0; RANK];
    let mut stride = 1;
    for i in (0..RANK).rev() {
        strides[i] = stride;
        stride *= shape[i];
    }
    strides
}

impl<T, const RANK: usize> Debug for Tensor<T, RANK>
where
    T: TensorElem,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("data_len", &self.data.len())
            .finish()
    }
}
