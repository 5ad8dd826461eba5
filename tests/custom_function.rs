//! The operation set is open: an external type implementing [`Function`]
//! participates in the graph through `apply` like the built-in operations.

use revgrad::autograd::{apply, Function, Variable};
use revgrad::tensor::{Result, Tensor, TensorError};
use std::rc::Rc;

/// Squares its single input.
#[derive(Debug)]
struct Square;

impl Function<f32, 0> for Square {
    fn forward(&self, inputs: &[Variable<f32, 0>]) -> Result<Tensor<f32, 0>> {
        match inputs {
            [x] => Ok(x.data().map(|v| v * v)),
            _ => Err(TensorError::Arity {
                op: "square",
                expected: 1,
                got: inputs.len(),
            }),
        }
    }

    fn backward(&self, inputs: &[Variable<f32, 0>], upstream: &Tensor<f32, 0>) -> Result<()> {
        match inputs {
            [x] => {
                // d(x^2)/dx = 2x
                let g = (&x.data().scale(2.0) * upstream)?;
                x.add_grad(&g)
            }
            _ => Err(TensorError::Arity {
                op: "square",
                expected: 1,
                got: inputs.len(),
            }),
        }
    }
}

#[test]
fn external_operation_propagates_gradient() {
    let x = Variable::new(Tensor::new(vec![3.0], []).unwrap(), true);

    let y = apply(Rc::new(Square), &[x.clone()]).unwrap();
    assert_eq!(y.data().data(), &[9.0]);

    y.backward().unwrap();

    assert_eq!(x.grad().data(), &[6.0]);
    assert_eq!(y.grad().data(), &[0.0]);
}

#[test]
fn external_operation_composes_with_builtins() {
    // w = x^2 + x, dw/dx = 2x + 1 = 7 at x = 3
    let x = Variable::new(Tensor::new(vec![3.0], []).unwrap(), true);

    let y = apply(Rc::new(Square), &[x.clone()]).unwrap();
    let w = (&y + &x).unwrap();

    w.backward().unwrap();

    assert_eq!(x.grad().data(), &[7.0]);
}

#[test]
fn arity_violation_is_reported() {
    let err = apply::<f32, 0>(Rc::new(Square), &[]);
    assert!(matches!(
        err,
        Err(TensorError::Arity {
            op: "square",
            expected: 1,
            got: 0
        })
    ));
}
