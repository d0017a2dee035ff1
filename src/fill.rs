//! Fill a tensor from a coordinate function.
//!
//! The function is called once per coordinate. It may run concurrently on
//! several threads and in any order, so it must not depend on shared
//! mutable state.

use std::convert::Infallible;

use crate::config::Config;
use crate::element::Element;
use crate::maybe_sync::{MaybeSend, MaybeSync};
use crate::odometer::Odometer;
use crate::tensor::Tensor;
use crate::threading::{for_each_range, should_parallelize};

/// Set every cell of `tensor` to `f(coordinate)`, using [`Config::global`].
pub fn fill<T, F>(tensor: &mut Tensor<T>, f: F)
where
    T: Element,
    F: Fn(&[usize]) -> T + MaybeSync,
{
    fill_with(tensor, f, Config::global());
}

/// Set every cell of `tensor` to `f(coordinate)` under `config`'s
/// threshold and split bound.
pub fn fill_with<T, F>(tensor: &mut Tensor<T>, f: F, config: &Config)
where
    T: Element,
    F: Fn(&[usize]) -> T + MaybeSync,
{
    let result: Result<(), Infallible> = try_fill_with(tensor, move |c| Ok(f(c)), config);
    match result {
        Ok(()) => {}
        Err(never) => match never {},
    }
}

/// Set every cell to `value`.
pub fn fill_value<T: Element>(tensor: &mut Tensor<T>, value: T) {
    fill(tensor, move |_| value.clone());
}

/// Fill with a fallible function, using [`Config::global`].
///
/// # Errors
/// Returns the first error produced by `f`. Cells written before the error
/// keep their new values.
pub fn try_fill<T, E, F>(tensor: &mut Tensor<T>, f: F) -> Result<(), E>
where
    T: Element,
    E: MaybeSend,
    F: Fn(&[usize]) -> Result<T, E> + MaybeSync,
{
    try_fill_with(tensor, f, Config::global())
}

/// Fill with a fallible function under `config`.
///
/// Scalars are assigned directly. Tensors with at most
/// `config.sequential_threshold` cells are walked in row-major order on the
/// calling thread. Larger tensors are split into disjoint linear ranges run
/// on the rayon pool; each leaf walks its range with its own [`Odometer`].
/// When several leaves fail, the error from the lowest range is returned
/// after all leaves have finished.
pub fn try_fill_with<T, E, F>(tensor: &mut Tensor<T>, f: F, config: &Config) -> Result<(), E>
where
    T: Element,
    E: MaybeSend,
    F: Fn(&[usize]) -> Result<T, E> + MaybeSync,
{
    let len = tensor.len();

    if tensor.rank() == 0 {
        let value = f(&[])?;
        unsafe { tensor.set_linear_unchecked(0, value) };
        return Ok(());
    }

    if !should_parallelize(len, config) {
        tracing::debug!(len, shape = ?tensor.shape(), "sequential fill");
        let mut odometer = Odometer::new(tensor.shape());
        for linear in 0..len {
            let value = f(odometer.current())?;
            unsafe { tensor.set_linear_unchecked(linear, value) };
            odometer.advance();
        }
        return Ok(());
    }

    tracing::debug!(
        len,
        shape = ?tensor.shape(),
        threshold = config.sequential_threshold,
        "parallel fill"
    );
    let shape = tensor.shape().to_vec();
    let writer = tensor.writer();
    for_each_range(0, len, config, &|start, end| {
        let mut odometer = Odometer::at(&shape, start);
        for linear in start..end {
            let value = f(odometer.current())?;
            // leaves cover disjoint linear ranges
            unsafe { writer.write(linear, value) };
            odometer.advance();
        }
        Ok(())
    })
}
