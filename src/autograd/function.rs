use super::Variable;
use crate::tensor::{Result, Tensor, TensorElem};
use log::debug;
use std::fmt;
use std::rc::Rc;

/// A differentiable operation: a forward rule paired with a backward rule.
///
/// Implementations are stateless per call; everything the backward rule
/// needs is read from the input variables it is handed. The operation set is
/// open: any type implementing this trait participates in the graph through
/// [`apply`].
pub trait Function<T, const RANK: usize>: fmt::Debug
where
    T: TensorElem,
{
    /// Computes the output value from the input variables.
    fn forward(&self, inputs: &[Variable<T, RANK>]) -> Result<Tensor<T, RANK>>;

    /// Pushes one gradient contribution into each input, given the upstream
    /// signal resting on the operation's output.
    ///
    /// Contributions are accumulated directly via [`Variable::add_grad`];
    /// recursing into each input's own continuation is the caller's job, not
    /// this rule's.
    fn backward(&self, inputs: &[Variable<T, RANK>], upstream: &Tensor<T, RANK>) -> Result<()>;
}

/// Applies `function` to `inputs`, recording the backward continuation on
/// the result.
///
/// This is the invocation protocol every operation shares: run the forward
/// rule, then wrap the produced value in a [`Variable`] whose continuation
/// closes over the operation and its inputs.
pub fn apply<T, const RANK: usize>(
    function: Rc<dyn Function<T, RANK>>,
    inputs: &[Variable<T, RANK>],
) -> Result<Variable<T, RANK>>
where
    T: TensorElem,
{
    let data = function.forward(inputs)?;
    debug!("recorded {:?} over {} input(s)", function, inputs.len());

    let back = Continuation {
        function,
        inputs: inputs.to_vec(),
    };
    Ok(Variable::with_continuation(data, back))
}

/// How an operation result pushes its gradient back into its inputs.
///
/// Holds the producing operation and handles to its inputs; input handles
/// are shared, so several continuations may point at the same node.
#[derive(Clone)]
pub(crate) struct Continuation<T, const RANK: usize>
where
    T: TensorElem,
{
    function: Rc<dyn Function<T, RANK>>,
    inputs: Vec<Variable<T, RANK>>,
}

impl<T, const RANK: usize> Continuation<T, RANK>
where
    T: TensorElem,
{
    /// Runs the operation's backward rule with `upstream`, then drives each
    /// input with a zero gradient so its own continuation fires and its gate
    /// applies.
    ///
    /// The zero keeps the drive from double-counting: the real contribution
    /// was already accumulated by the rule in the first step.
    pub(crate) fn fire(&self, upstream: &Tensor<T, RANK>) -> Result<()> {
        self.function.backward(&self.inputs, upstream)?;

        for input in &self.inputs {
            input.backward_with(&Tensor::zeros(input.shape()))?;
        }
        Ok(())
    }
}

impl<T, const RANK: usize> fmt::Debug for Continuation<T, RANK>
where
    T: TensorElem,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("function", &self.function)
            .field("inputs", &self.inputs.len())
            .finish()
    }
}
