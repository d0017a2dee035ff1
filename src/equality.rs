//! Structural and approximate equality.

use crate::element::{ApproxElement, Element};
use crate::odometer::Odometer;
use crate::tensor::TensorLike;

/// Walk both operands in row-major order and stop at the first pair of
/// cells for which `same` is false.
fn all_cells<A, B, F>(a: &A, b: &B, same: F) -> bool
where
    A: TensorLike,
    B: TensorLike<Elem = A::Elem>,
    F: Fn(&A::Elem, &A::Elem) -> bool,
{
    if a.shape() != b.shape() {
        return false;
    }
    let mut odometer = Odometer::new(a.shape());
    loop {
        let coord = odometer.current();
        // both shapes equal, so the odometer only yields valid coordinates
        let (x, y) = unsafe { (a.cell_unchecked(coord), b.cell_unchecked(coord)) };
        if !same(x, y) {
            return false;
        }
        if !odometer.advance() {
            return true;
        }
    }
}

/// True when both operands have the same shape and every pair of cells is
/// equal under [`Element::cell_eq`].
pub fn equals<A, B>(a: &A, b: &B) -> bool
where
    A: TensorLike,
    B: TensorLike<Elem = A::Elem>,
{
    all_cells(a, b, |x, y| x.cell_eq(y))
}

/// [`almost_equals_with`] using the element type's default tolerances.
pub fn almost_equals<A, B>(a: &A, b: &B) -> bool
where
    A: TensorLike,
    A::Elem: ApproxElement,
    B: TensorLike<Elem = A::Elem>,
{
    almost_equals_with(
        a,
        b,
        <A::Elem as ApproxElement>::DEFAULT_DELTA,
        <A::Elem as ApproxElement>::DEFAULT_EPSILON,
    )
}

/// True when both operands have the same shape and every pair of cells is
/// within `delta` absolutely or `epsilon` relatively.
pub fn almost_equals_with<A, B>(a: &A, b: &B, delta: A::Elem, epsilon: A::Elem) -> bool
where
    A: TensorLike,
    A::Elem: ApproxElement,
    B: TensorLike<Elem = A::Elem>,
{
    all_cells(a, b, |&x, &y| x.approx_eq(y, delta, epsilon))
}
