use super::function::{apply, Function};
use super::Variable;
use crate::tensor::{Gemm, Result, Tensor, TensorElem, TensorError};
use std::ops::{Add, Mul, Neg, Sub};
use std::rc::Rc;

fn unary<'a, T, const RANK: usize>(
    op: &'static str,
    inputs: &'a [Variable<T, RANK>],
) -> Result<&'a Variable<T, RANK>>
where
    T: TensorElem,
{
    match inputs {
        [a] => Ok(a),
        _ => Err(TensorError::Arity {
            op,
            expected: 1,
            got: inputs.len(),
        }),
    }
}

fn binary<'a, T, const RANK: usize>(
    op: &'static str,
    inputs: &'a [Variable<T, RANK>],
) -> Result<(&'a Variable<T, RANK>, &'a Variable<T, RANK>)>
where
    T: TensorElem,
{
    match inputs {
        [a, b] => Ok((a, b)),
        _ => Err(TensorError::Arity {
            op,
            expected: 2,
            got: inputs.len(),
        }),
    }
}

/// Element-wise addition.
///
/// d(a + b)/da = 1, d(a + b)/db = 1: the upstream signal passes through to
/// both inputs unchanged.
#[derive(Debug)]
pub struct AddOp;

impl<T, const RANK: usize> Function<T, RANK> for AddOp
where
    T: TensorElem,
{
    fn forward(&self, inputs: &[Variable<T, RANK>]) -> Result<Tensor<T, RANK>> {
        let (a, b) = binary("add", inputs)?;
        &a.data() + &b.data()
    }

    fn backward(&self, inputs: &[Variable<T, RANK>], upstream: &Tensor<T, RANK>) -> Result<()> {
        let (a, b) = binary("add", inputs)?;
        a.add_grad(upstream)?;
        b.add_grad(upstream)
    }
}

/// Element-wise subtraction.
#[derive(Debug)]
pub struct SubOp;

impl<T, const RANK: usize> Function<T, RANK> for SubOp
where
    T: TensorElem,
{
    fn forward(&self, inputs: &[Variable<T, RANK>]) -> Result<Tensor<T, RANK>> {
        let (a, b) = binary("sub", inputs)?;
        &a.data() - &b.data()
    }

    fn backward(&self, inputs: &[Variable<T, RANK>], upstream: &Tensor<T, RANK>) -> Result<()> {
        let (a, b) = binary("sub", inputs)?;
        a.add_grad(upstream)?;
        b.add_grad(&upstream.map(|v| T::zero() - v))
    }
}

/// Element-wise multiplication.
///
/// d(a * b)/da = b, d(a * b)/db = a.
#[derive(Debug)]
pub struct MulOp;

impl<T, const RANK: usize> Function<T, RANK> for MulOp
where
    T: TensorElem,
{
    fn forward(&self, inputs: &[Variable<T, RANK>]) -> Result<Tensor<T, RANK>> {
        let (a, b) = binary("mul", inputs)?;
        &a.data() * &b.data()
    }

    fn backward(&self, inputs: &[Variable<T, RANK>], upstream: &Tensor<T, RANK>) -> Result<()> {
        let (a, b) = binary("mul", inputs)?;
        // Read both operands before accumulating: the inputs may alias the
        // same variable (x * x).
        let lhs = a.data();
        let rhs = b.data();
        a.add_grad(&(&rhs * upstream)?)?;
        b.add_grad(&(&lhs * upstream)?)
    }
}

/// Element-wise negation.
#[derive(Debug)]
pub struct NegOp;

impl<T, const RANK: usize> Function<T, RANK> for NegOp
where
    T: TensorElem,
{
    fn forward(&self, inputs: &[Variable<T, RANK>]) -> Result<Tensor<T, RANK>> {
        let a = unary("neg", inputs)?;
        Ok(a.data().map(|v| T::zero() - v))
    }

    fn backward(&self, inputs: &[Variable<T, RANK>], upstream: &Tensor<T, RANK>) -> Result<()> {
        let a = unary("neg", inputs)?;
        a.add_grad(&upstream.map(|v| T::zero() - v))
    }
}

/// Matrix multiplication over rank-2 variables.
///
/// For C = A * B: dC/dA = upstream * B^T, dC/dB = A^T * upstream.
#[derive(Debug)]
pub struct MatMulOp;

impl<T> Function<T, 2> for MatMulOp
where
    T: TensorElem + Gemm,
{
    fn forward(&self, inputs: &[Variable<T, 2>]) -> Result<Tensor<T, 2>> {
        let (a, b) = binary("matmul", inputs)?;
        a.data().matmul(&b.data())
    }

    fn backward(&self, inputs: &[Variable<T, 2>], upstream: &Tensor<T, 2>) -> Result<()> {
        let (a, b) = binary("matmul", inputs)?;
        let lhs = a.data();
        let rhs = b.data();
        a.add_grad(&upstream.matmul(&rhs.transpose())?)?;
        b.add_grad(&lhs.transpose().matmul(upstream)?)
    }
}

impl<T, const RANK: usize> Add for &Variable<T, RANK>
where
    T: TensorElem,
{
    type Output = Result<Variable<T, RANK>>;

    /// Adds two variables element-wise, recording the operation on the graph.
    fn add(self, rhs: Self) -> Self::Output {
        apply(Rc::new(AddOp), &[self.clone(), rhs.clone()])
    }
}

impl<T, const RANK: usize> Sub for &Variable<T, RANK>
where
    T: TensorElem,
{
    type Output = Result<Variable<T, RANK>>;

    fn sub(self, rhs: Self) -> Self::Output {
        apply(Rc::new(SubOp), &[self.clone(), rhs.clone()])
    }
}

impl<T, const RANK: usize> Mul for &Variable<T, RANK>
where
    T: TensorElem,
{
    type Output = Result<Variable<T, RANK>>;

    /// Multiplies two variables element-wise, recording the operation on the
    /// graph.
    fn mul(self, rhs: Self) -> Self::Output {
        apply(Rc::new(MulOp), &[self.clone(), rhs.clone()])
    }
}

impl<T, const RANK: usize> Neg for &Variable<T, RANK>
where
    T: TensorElem,
{
    type Output = Result<Variable<T, RANK>>;

    fn neg(self) -> Self::Output {
        apply(Rc::new(NegOp), &[self.clone()])
    }
}

impl<T> Variable<T, 2>
where
    T: TensorElem + Gemm,
{
    /// Matrix product of two rank-2 variables, recorded on the graph.
    pub fn matmul(&self, rhs: &Self) -> Result<Self> {
        apply(Rc::new(MatMulOp), &[self.clone(), rhs.clone()])
    }
}
