//! Copy and numeric cast between tensors of the same shape.
//!
//! Both run through the fill engine, so large copies are split across the
//! rayon pool the same way fills are.

use num_traits::AsPrimitive;

use crate::config::Config;
use crate::element::Element;
use crate::fill::{fill, fill_with};
use crate::index::ensure_same_shape;
use crate::maybe_sync::MaybeSync;
use crate::tensor::{DenseFactory, Tensor, TensorFactory, TensorLike};
use crate::Result;

/// Copy every cell of `source` into `sink`.
///
/// # Errors
/// [`crate::TensorError::ShapeMismatch`] if the shapes differ. Neither
/// operand is touched in that case.
pub fn copy_to<S>(source: &S, sink: &mut Tensor<S::Elem>) -> Result<()>
where
    S: TensorLike + MaybeSync,
{
    copy_to_with(source, sink, Config::global())
}

/// [`copy_to`] under `config`'s threshold and split bound.
pub fn copy_to_with<S>(source: &S, sink: &mut Tensor<S::Elem>, config: &Config) -> Result<()>
where
    S: TensorLike + MaybeSync,
{
    ensure_same_shape(source.shape(), sink.shape())?;
    // shapes match, so every coordinate fill hands out is valid for source
    fill_with(sink, |c| unsafe { source.cell_unchecked(c).clone() }, config);
    Ok(())
}

/// Copy `source` into `sink`, converting each cell with `as` semantics
/// (float to int truncates toward zero and saturates, int narrowing wraps).
///
/// # Errors
/// [`crate::TensorError::ShapeMismatch`] if the shapes differ.
pub fn cast_to<S, D>(source: &S, sink: &mut Tensor<D>) -> Result<()>
where
    S: TensorLike + MaybeSync,
    S::Elem: AsPrimitive<D>,
    D: Element + Copy,
{
    ensure_same_shape(source.shape(), sink.shape())?;
    fill(sink, |c| {
        let value: S::Elem = unsafe { *source.cell_unchecked(c) };
        value.as_()
    });
    Ok(())
}

/// New tensor holding the contents of `source`, laid out with the default
/// [`DenseFactory`].
pub fn copy_of<S>(source: &S) -> Result<Tensor<S::Elem>>
where
    S: TensorLike + MaybeSync,
{
    copy_of_with(source, &DenseFactory::default())
}

/// New tensor built by `factory`, holding the contents of `source`.
pub fn copy_of_with<S, F>(source: &S, factory: &F) -> Result<Tensor<S::Elem>>
where
    S: TensorLike + MaybeSync,
    F: TensorFactory + ?Sized,
{
    let mut sink = factory.create(source.shape(), None)?;
    copy_to(source, &mut sink)?;
    Ok(sink)
}

/// New tensor of element type `D` built by `factory`, holding `source`
/// converted cell by cell.
pub fn cast_copy_of<S, D, F>(source: &S, factory: &F) -> Result<Tensor<D>>
where
    S: TensorLike + MaybeSync,
    S::Elem: AsPrimitive<D>,
    D: Element + Copy,
    F: TensorFactory + ?Sized,
{
    let mut sink = factory.create(source.shape(), None)?;
    cast_to(source, &mut sink)?;
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TensorError;

    #[test]
    fn test_copy_to() {
        let src = Tensor::from_vec(&[2, 3], vec![1i64, 2, 3, 4, 5, 6]).unwrap();
        let mut dst = Tensor::<i64>::new(&[2, 3]).unwrap();
        copy_to(&src, &mut dst).unwrap();
        assert_eq!(dst.to_vec(), src.to_vec());
    }

    #[test]
    fn test_copy_shape_mismatch_touches_nothing() {
        let src = Tensor::with_value(&[3, 4], 1.0f64).unwrap();
        let mut dst = Tensor::with_value(&[4, 3], 2.0f64).unwrap();
        let err = copy_to(&src, &mut dst).unwrap_err();
        assert_eq!(err, TensorError::ShapeMismatch(vec![3, 4], vec![4, 3]));
        assert!(src.iter().all(|&x| x == 1.0));
        assert!(dst.iter().all(|&x| x == 2.0));
    }

    #[test]
    fn test_copy_rank_mismatch() {
        let src = Tensor::<i8>::new(&[4]).unwrap();
        let mut dst = Tensor::<i8>::new(&[4, 1]).unwrap();
        assert!(copy_to(&src, &mut dst).is_err());
    }

    #[test]
    fn test_copy_to_with_parallel_config() {
        let src = Tensor::from_fn(&[30, 40], |c| (c[0] * 40 + c[1]) as i32).unwrap();
        let mut dst = Tensor::<i32>::new(&[30, 40]).unwrap();
        let config = Config::default()
            .with_sequential_threshold(32)
            .with_surplus_queued_tasks(8);
        copy_to_with(&src, &mut dst, &config).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn test_copy_of_is_independent() {
        let mut src = Tensor::from_vec(&[2], vec![Some("a".to_string()), None]).unwrap();
        let copy = copy_of(&src).unwrap();
        src.set(&[1], Some("b".to_string())).unwrap();
        assert_eq!(copy.get(&[1]).unwrap(), None);
        assert_eq!(copy.get(&[0]).unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn test_copy_of_with_factory_layout() {
        let src = Tensor::from_fn(&[5, 5], |c| (c[0] * 5 + c[1]) as i32).unwrap();
        let factory = DenseFactory::new(Config::default().with_segment_max(7));
        let copy = copy_of_with(&src, &factory).unwrap();
        assert_eq!(copy.segments().len(), 4);
        assert_eq!(copy, src);
    }

    #[test]
    fn test_copy_from_view() {
        let src = Tensor::from_vec(&[2, 1, 2], vec![1u16, 2, 3, 4]).unwrap();
        let view = src.collapse(&[1]).unwrap();
        let copy = copy_of(&view).unwrap();
        assert_eq!(copy.shape(), &[2, 2]);
        assert_eq!(copy.to_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_cast_narrowing() {
        let src = Tensor::from_vec(&[4], vec![1.9f64, -1.9, 300.5, -0.2]).unwrap();
        let mut dst = Tensor::<i32>::new(&[4]).unwrap();
        cast_to(&src, &mut dst).unwrap();
        assert_eq!(dst.to_vec(), vec![1, -1, 300, 0]);

        let mut bytes = Tensor::<i8>::new(&[4]).unwrap();
        cast_to(&dst, &mut bytes).unwrap();
        assert_eq!(bytes.to_vec(), vec![1, -1, 44, 0]);
    }

    #[test]
    fn test_cast_copy_of_widening() {
        let src = Tensor::from_vec(&[3], vec![1i16, -2, 3]).unwrap();
        let wide: Tensor<f32> = cast_copy_of(&src, &DenseFactory::default()).unwrap();
        assert_eq!(wide.to_vec(), vec![1.0, -2.0, 3.0]);
    }

    #[test]
    fn test_cast_shape_mismatch() {
        let src = Tensor::<f32>::new(&[2]).unwrap();
        let mut dst = Tensor::<i64>::new(&[3]).unwrap();
        assert_eq!(
            cast_to(&src, &mut dst).unwrap_err(),
            TensorError::ShapeMismatch(vec![2], vec![3])
        );
    }
}
