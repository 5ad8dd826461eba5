//! Reverse-mode automatic differentiation over [`Tensor`]s.
//!
//! The graph is implicit: applying an operation to [`Variable`]s returns a
//! new `Variable` carrying a backward continuation that closes over the
//! operation and its inputs. [`Variable::backward`] on the terminal output
//! seeds an all-ones gradient and walks the continuations depth-first.
//!
//! Each node follows the same three-step contract, in order:
//!
//! 1. accumulate the incoming gradient into `grad`;
//! 2. fire the continuation (if any) with the accumulated value, which runs
//!    the producing operation's backward rule and then drives each input
//!    with a zero gradient to recurse;
//! 3. apply the `requires_grad` gate: a node not marked as retaining its
//!    gradient has `grad` reset to zeros once it has been passed downstream.
//!
//! The gate runs after the recursive push, so a gradient is always consumed
//! before it is cleared; variables marked `requires_grad = true` keep their
//! accumulated value for inspection after the pass.

use crate::tensor::{Result, Tensor, TensorElem};
use log::trace;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub mod function;
pub mod functional;
pub mod ops;

pub use function::{apply, Function};

/// A node in the computation graph: a value, its accumulated gradient, and
/// an optional continuation back to the operation that produced it.
///
/// `Variable` is a cheap handle; clones share the same underlying node, so a
/// value consumed by several operations accumulates every consumer's
/// gradient contribution.
#[derive(Clone)]
pub struct Variable<T, const RANK: usize>
where
    T: TensorElem,
{
    inner: Rc<RefCell<VariableInner<T, RANK>>>,
}

struct VariableInner<T, const RANK: usize>
where
    T: TensorElem,
{
    data: Tensor<T, RANK>,
    grad: Tensor<T, RANK>,
    requires_grad: bool,
    back: Option<function::Continuation<T, RANK>>,
}

impl<T, const RANK: usize> Variable<T, RANK>
where
    T: TensorElem,
{
    /// Creates a leaf variable.
    ///
    /// The gradient starts as zeros of `data`'s shape. Leaves have no
    /// backward continuation; `requires_grad` decides whether gradient
    /// pushed into this node rests here or is discarded after the pass.
    pub fn new(data: Tensor<T, RANK>, requires_grad: bool) -> Self {
        let grad = Tensor::zeros(*data.shape());
        Self {
            inner: Rc::new(RefCell::new(VariableInner {
                data,
                grad,
                requires_grad,
                back: None,
            })),
        }
    }

    /// Creates an operation result carrying its backward continuation.
    ///
    /// Results do not retain a resting gradient: the gate clears them once
    /// their gradient has been propagated, which also makes repeated firings
    /// through a shared intermediate count each consumer exactly once.
    pub(crate) fn with_continuation(
        data: Tensor<T, RANK>,
        back: function::Continuation<T, RANK>,
    ) -> Self {
        let grad = Tensor::zeros(*data.shape());
        Self {
            inner: Rc::new(RefCell::new(VariableInner {
                data,
                grad,
                requires_grad: false,
                back: Some(back),
            })),
        }
    }

    /// Returns a copy of the value held at this node.
    pub fn data(&self) -> Tensor<T, RANK> {
        self.inner.borrow().data.clone()
    }

    /// Returns a copy of the gradient currently resting on this node.
    pub fn grad(&self) -> Tensor<T, RANK> {
        self.inner.borrow().grad.clone()
    }

    /// Returns the shape of the value held at this node.
    pub fn shape(&self) -> [usize; RANK] {
        *self.inner.borrow().data.shape()
    }

    /// Whether this node retains its gradient after a backward pass.
    pub fn requires_grad(&self) -> bool {
        self.inner.borrow().requires_grad
    }

    /// Resets the accumulated gradient to zeros.
    ///
    /// Gradients accumulate across backward passes; call this between
    /// passes when fresh per-pass gradients are wanted.
    pub fn zero_grad(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.grad = Tensor::zeros(*inner.data.shape());
    }

    /// Adds a gradient contribution to this node without propagating it.
    ///
    /// This is the entry point operation backward rules use to push their
    /// per-input contributions; recursion into this node's own continuation
    /// is triggered separately by a zero-gradient [`Variable::backward_with`]
    /// drive.
    ///
    /// # Errors
    ///
    /// Returns a shape error if `grad` does not match this node's shape.
    pub fn add_grad(&self, grad: &Tensor<T, RANK>) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.grad = (&inner.grad + grad)?;
        Ok(())
    }

    /// Runs a backward pass from this node, seeding the multiplicative
    /// identity (an all-ones gradient) as d(output)/d(output).
    pub fn backward(&self) -> Result<()> {
        self.backward_with(&Tensor::ones(self.shape()))
    }

    /// Accumulates `upstream` into this node's gradient, fires the backward
    /// continuation (if any) with the accumulated value, then applies the
    /// `requires_grad` gate.
    ///
    /// The gate runs after the continuation, so downstream propagation sees
    /// the full accumulated gradient; only the resting value is gated. On a
    /// leaf this accumulates and gates without recursing.
    pub fn backward_with(&self, upstream: &Tensor<T, RANK>) -> Result<()> {
        self.add_grad(upstream)?;

        let back = self.inner.borrow().back.clone();
        if let Some(back) = back {
            let signal = self.grad();
            trace!("firing {:?}, signal shape {:?}", back, signal.shape());
            back.fire(&signal)?;
        }

        let mut inner = self.inner.borrow_mut();
        if !inner.requires_grad {
            inner.grad = Tensor::zeros(*inner.data.shape());
        }
        Ok(())
    }
}

impl<T, const RANK: usize> fmt::Debug for Variable<T, RANK>
where
    T: TensorElem,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Variable")
            .field("shape", inner.data.shape())
            .field("requires_grad", &inner.requires_grad)
            .field("leaf", &inner.back.is_none())
            .finish()
    }
}
