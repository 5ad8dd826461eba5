//! End-to-end backward passes over hand-built graphs, checked against
//! analytic derivatives.

use revgrad::tensor::{Tensor, TensorError};
use revgrad::Variable;

fn scalar(v: f32, requires_grad: bool) -> Variable<f32, 0> {
    Variable::new(Tensor::new(vec![v], []).unwrap(), requires_grad)
}

#[test]
fn deep_chain_fourth_power() {
    // w = ((x * x) * x) * x = x^4, dw/dx = 4x^3 = 32 at x = 2
    let x = scalar(2.0, true);
    let x2 = (&x * &x).unwrap();
    let x3 = (&x2 * &x).unwrap();
    let x4 = (&x3 * &x).unwrap();

    x4.backward().unwrap();

    assert_eq!(x4.data().data(), &[16.0]);
    assert_eq!(x.grad().data(), &[32.0]);

    // Intermediates were consumed and settled to zero.
    assert_eq!(x2.grad().data(), &[0.0]);
    assert_eq!(x3.grad().data(), &[0.0]);
    assert_eq!(x4.grad().data(), &[0.0]);
}

#[test]
fn fanout_applies_sum_rule() {
    // y = x * x, z = x + c, w = y + z
    // dw/dx = 2x + 1 = 7 at x = 3; c is a constant and keeps no gradient.
    let x = scalar(3.0, true);
    let c = scalar(1.0, false);

    let y = (&x * &x).unwrap();
    let z = (&x + &c).unwrap();
    let w = (&y + &z).unwrap();

    w.backward().unwrap();

    assert_eq!(x.grad().data(), &[7.0]);
    assert_eq!(c.grad().data(), &[0.0]);
}

#[test]
fn shared_intermediate_counts_every_consumer() {
    // y = x * x consumed twice: w = y + y = 2x^2, dw/dx = 4x = 12 at x = 3.
    // Both consumers accumulate into y before its recursion double-fires;
    // the consumed-gradient reset keeps the second firing from
    // double-counting.
    let x = scalar(3.0, true);
    let y = (&x * &x).unwrap();
    let w = (&y + &y).unwrap();

    w.backward().unwrap();

    assert_eq!(x.grad().data(), &[12.0]);
    assert_eq!(y.grad().data(), &[0.0]);
}

#[test]
fn second_pass_accumulates_on_settled_grads() {
    let x = scalar(3.0, true);
    let y = (&x * &x).unwrap();

    y.backward().unwrap();
    assert_eq!(x.grad().data(), &[6.0]);

    // A repeated pass starts from the settled gradient.
    y.backward().unwrap();
    assert_eq!(x.grad().data(), &[12.0]);

    // zero_grad restores fresh-pass behavior.
    x.zero_grad();
    y.backward().unwrap();
    assert_eq!(x.grad().data(), &[6.0]);
}

#[test]
fn elementwise_gradients_keep_shape() {
    let a = Variable::new(Tensor::<f32, 1>::new(vec![2.0, 3.0], [2]).unwrap(), true);
    let b = Variable::new(Tensor::<f32, 1>::new(vec![4.0, 5.0], [2]).unwrap(), true);

    let c = (&a * &b).unwrap();
    c.backward().unwrap();

    // d(a ⊙ b)/da = b, element-wise.
    assert_eq!(a.grad().data(), &[4.0, 5.0]);
    assert_eq!(b.grad().data(), &[2.0, 3.0]);
}

#[test]
fn matmul_gradients() {
    // C = A @ B with A: [2, 2], B: [2, 2], seeded with ones:
    // dC/dA = 1 @ B^T, dC/dB = A^T @ 1.
    let a = Variable::new(
        Tensor::<f32, 2>::new(vec![1.0, 2.0, 3.0, 4.0], [2, 2]).unwrap(),
        true,
    );
    let b = Variable::new(
        Tensor::<f32, 2>::new(vec![5.0, 6.0, 7.0, 8.0], [2, 2]).unwrap(),
        true,
    );

    let c = a.matmul(&b).unwrap();
    c.backward().unwrap();

    // ones @ B^T: each row is [5+6, 7+8] = [11, 15]
    assert_eq!(a.grad().data(), &[11.0, 15.0, 11.0, 15.0]);
    // A^T @ ones: rows [1+3, 1+3] and [2+4, 2+4]
    assert_eq!(b.grad().data(), &[4.0, 4.0, 6.0, 6.0]);
}

#[test]
fn shape_mismatch_surfaces_as_error() {
    let a = Variable::new(Tensor::<f32, 1>::zeros([2]), true);
    let b = Variable::new(Tensor::<f32, 1>::zeros([3]), true);

    assert!(matches!(&a + &b, Err(TensorError::ShapeMismatch { .. })));

    // A wrong-shaped upstream seed is the same contract violation.
    let err = a.backward_with(&Tensor::<f32, 1>::ones([3]));
    assert!(matches!(err, Err(TensorError::ShapeMismatch { .. })));
}
