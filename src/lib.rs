//! # revgrad
//!
//! `revgrad` is a pure Rust implementation of reverse-mode automatic
//! differentiation (backpropagation) over owned N-dimensional tensors.
//!
//! A computation graph is built implicitly by applying operations to
//! [`Variable`]s; each operation returns a new `Variable` carrying a backward
//! continuation that knows how to push gradient into its inputs. Calling
//! [`Variable::backward`] on the terminal output walks the recorded graph
//! depth-first and accumulates gradients into every participating variable.
//!
//! ## Modules
//!
//! - [`mod@tensor`]: owned N-dimensional tensor and element-wise kernels.
//! - [`autograd`]: the Variable/Function graph and the backward pass.
//!
//! ## Example
//!
//! ```rust
//! use revgrad::autograd::Variable;
//! use revgrad::tensor::Tensor;
//!
//! let x = Variable::new(Tensor::<f32, 0>::new(vec![3.0], []).unwrap(), true);
//! let y = (&x * &x).unwrap();
//! y.backward().unwrap();
//!
//! // d(x^2)/dx = 2x = 6
//! assert_eq!(x.grad().data(), &[6.0]);
//! ```

/// Macro for creating a Tensor with compile-time shape checking.
///
/// # Examples
///
/// ```rust
/// use revgrad::tensor;
/// use revgrad::tensor::Tensor;
///
/// // Works
/// let t = tensor!([1.0, 2.0, 3.0, 4.0], [2, 2]);
///
/// // Fails to compile:
/// // let t = tensor!([1.0, 2.0, 3.0], [2, 2]);
/// ```
#[macro_export]
macro_rules! tensor {
    ($data:expr, $shape:expr) => {{
        // Constants to force compile-time evaluation
        const DATA_LEN: usize = $data.len();
        const SHAPE: [usize; $shape.len()] = $shape;
        const EXPECTED_SIZE: usize = {
            let mut size = 1;
            let mut i = 0;
            while i < SHAPE.len() {
                size *= SHAPE[i];
                i += 1;
            }
            size
        };

        // This assertion triggers a compile-time error if false
        const _: () = assert!(
            DATA_LEN == EXPECTED_SIZE,
            "Shape mismatch: data length does not match shape product"
        );

        // Safe to unwrap because we checked at compile time
        $crate::tensor::Tensor::new($data.to_vec(), $shape).unwrap()
    }};
}

pub mod autograd;
pub mod tensor;

pub use autograd::Variable;
pub use tensor::Tensor;
