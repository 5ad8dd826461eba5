use super::{Result, Tensor, TensorElem, TensorError};
use rayon::prelude::*;
use std::ops::{Add, Mul, Sub};

// Simple macro to implement arithmetic traits
macro_rules! impl_bin_op {
    ($trait:ident, $method:ident) => {
        impl<T, const RANK: usize> $trait for &Tensor<T, RANK>
        where
            T: TensorElem,
        {
            type Output = Result<Tensor<T, RANK>>;

            fn $method(self, rhs: Self) -> Self::Output {
                if self.shape != rhs.shape {
                    return Err(TensorError::ShapeMismatch {
                        expected: self.shape.to_vec(),
                        got: rhs.shape.to_vec(),
                    });
                }

                let mut out = Tensor::zeros(self.shape);
                // Seamless parallelism using rayon
                out.data
                    .par_iter_mut()
                    .zip(self.data.par_iter())
                    .zip(rhs.data.par_iter())
                    .for_each(|((o, a), b)| {
                        *o = a.$method(*b);
                    });

                Ok(out)
            }
        }
    };
}

impl_bin_op!(Add, add);
impl_bin_op!(Sub, sub);
impl_bin_op!(Mul, mul);

impl<T, const RANK: usize> Tensor<T, RANK>
where
    T: TensorElem,
{
    /// Applies a function element-wise.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(T) -> T + Sync + Send,
    {
        let mut out = Tensor::zeros(self.shape);
        out.data
            .par_iter_mut()
            .zip(self.data.par_iter())
            .for_each(|(o, i)| *o = f(*i));
        out
    }

    /// Multiplies every element by `k`.
    pub fn scale(&self, k: T) -> Self {
        self.map(move |v| v * k)
    }
}

/// Hook for delegating 2-D matrix multiplication to an optimized kernel.
///
/// Implemented for the element types `matrixmultiply` has a routine for.
pub trait Gemm: TensorElem {
    /// Computes `out = a * b` for row-major `a: [m, k]`, `b: [k, n]` and
    /// `out: [m, n]`. Slices must be contiguous and of matching length.
    fn gemm(m: usize, k: usize, n: usize, a: &[Self], b: &[Self], out: &mut [Self]);
}

impl Gemm for f32 {
    fn gemm(m: usize, k: usize, n: usize, a: &[f32], b: &[f32], out: &mut [f32]) {
        // Row-major: row stride = column count, column stride = 1.
        unsafe {
            matrixmultiply::sgemm(
                m,
                k,
                n,
                1.0,
                a.as_ptr(),
                k as isize,
                1,
                b.as_ptr(),
                n as isize,
                1,
                0.0,
                out.as_mut_ptr(),
                n as isize,
                1,
            );
        }
    }
}

impl Gemm for f64 {
    fn gemm(m: usize, k: usize, n: usize, a: &[f64], b: &[f64], out: &mut [f64]) {
        unsafe {
            matrixmultiply::dgemm(
                m,
                k,
                n,
                1.0,
                a.as_ptr(),
                k as isize,
                1,
                b.as_ptr(),
                n as isize,
                1,
                0.0,
                out.as_mut_ptr(),
                n as isize,
                1,
            );
        }
    }
}

impl<T> Tensor<T, 2>
where
    T: TensorElem + Gemm,
{
    /// Matrix multiplication: `[M, K] x [K, N] -> [M, N]`.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if the inner dimensions disagree.
    pub fn matmul(&self, rhs: &Self) -> Result<Self> {
        let [m, k] = self.shape;
        let [k2, n] = rhs.shape;

        if k != k2 {
            return Err(TensorError::ShapeMismatch {
                expected: vec![m, k],
                got: vec![k2, n],
            });
        }

        let mut out = Tensor::zeros([m, n]);
        T::gemm(m, k, n, &self.data, &rhs.data, &mut out.data);
        Ok(out)
    }
}

impl<T> Tensor<T, 2>
where
    T: TensorElem,
{
    /// Transposes a rank-2 tensor: `[M, N] -> [N, M]`.
    pub fn transpose(&self) -> Self {
        let [m, n] = self.shape;
        let mut out = Tensor::zeros([n, m]);

        let src = &self.data;
        let strides = self.strides;
        out.data
            .par_chunks_mut(m)
            .enumerate()
            .for_each(|(c, col)| {
                for (r, slot) in col.iter_mut().enumerate() {
                    *slot = src[r * strides[0] + c * strides[1]];
                }
            });
        out
    }
}
