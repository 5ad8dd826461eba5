use crate::autograd::Variable;
use crate::tensor::{Result, Tensor, TensorElem};

/// Computes the gradient of a function `f` with respect to its input.
///
/// Returns a closure that takes a `Tensor` input and returns the gradient
/// `Tensor`.
///
/// # Example
/// ```ignore
/// let grad_square = grad(|x| &x * &x);
/// let g = grad_square(Tensor::new(vec![3.0], []).unwrap()).unwrap();
/// // g = 6.0
/// ```
pub fn grad<F, T, const RANK: usize>(f: F) -> impl Fn(Tensor<T, RANK>) -> Result<Tensor<T, RANK>>
where
    F: Fn(Variable<T, RANK>) -> Result<Variable<T, RANK>>,
    T: TensorElem,
{
    move |x| {
        let x = Variable::new(x, true);
        let y = f(x.clone())?;
        y.backward()?;

        // A function that ignores its input leaves the seed's zeros behind.
        Ok(x.grad())
    }
}

type ValueAndGrad<T, const RANK: usize> = (Tensor<T, RANK>, Tensor<T, RANK>);

/// Computes the value and gradient of a function `f` with respect to its
/// input.
///
/// Returns a closure that takes a `Tensor` input and returns a tuple
/// `(value, gradient)`.
pub fn value_and_grad<F, T, const RANK: usize>(
    f: F,
) -> impl Fn(Tensor<T, RANK>) -> Result<ValueAndGrad<T, RANK>>
where
    F: Fn(Variable<T, RANK>) -> Result<Variable<T, RANK>>,
    T: TensorElem,
{
    move |x| {
        let x = Variable::new(x, true);
        let y = f(x.clone())?;
        y.backward()?;

        Ok((y.data(), x.grad()))
    }
}
