//! Row-major coordinate addressing over segmented storage.
//!
//! An [`Index`] is computed once per shape. It maps a coordinate to a linear
//! position `Σ coord[i] * stride[i]` (last dimension has stride 1), and the
//! linear position to a [`Point`] inside the segment array.
//!
//! Fixed-rank coordinates are passed as `[usize; N]`, which keeps them on the
//! stack and lets the stride loop unroll. Any-rank coordinates are passed as
//! `[usize]` or `Vec<usize>`. Both go through the [`Coordinate`] trait, so
//! every accessor taking `&C where C: Coordinate + ?Sized` accepts either.

use crate::config::Config;
use crate::{Result, TensorError, SEGMENT_MAX};

/// Physical location of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub segment: usize,
    pub offset: usize,
}

/// A coordinate that can be mapped through an [`Index`].
pub trait Coordinate {
    /// Coordinate components, outermost dimension first.
    fn components(&self) -> &[usize];

    /// Linear position for the given strides. Performs no validation.
    #[inline]
    fn linear(&self, strides: &[usize]) -> usize {
        self.components()
            .iter()
            .zip(strides)
            .map(|(&c, &s)| c * s)
            .sum()
    }
}

impl<const N: usize> Coordinate for [usize; N] {
    #[inline(always)]
    fn components(&self) -> &[usize] {
        self
    }

    #[inline(always)]
    fn linear(&self, strides: &[usize]) -> usize {
        let strides = &strides[..N];
        let mut pos = 0usize;
        for i in 0..N {
            pos += self[i] * strides[i];
        }
        pos
    }
}

impl Coordinate for [usize] {
    #[inline(always)]
    fn components(&self) -> &[usize] {
        self
    }
}

impl Coordinate for Vec<usize> {
    #[inline(always)]
    fn components(&self) -> &[usize] {
        self
    }
}

/// Immutable addressing scheme for one shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    shape: Vec<usize>,
    strides: Vec<usize>,
    len: usize,
    segment_max: usize,
    rollover: bool,
}

impl Index {
    /// Build the index for `shape` with the default segment limit.
    ///
    /// # Errors
    /// [`TensorError::InvalidShape`] if a dimension is 0,
    /// [`TensorError::CapacityExceeded`] if the element count exceeds
    /// `SEGMENT_MAX²`.
    pub fn new(shape: &[usize]) -> Result<Self> {
        Self::with_config(shape, &Config::default())
    }

    /// Build the index for `shape` using `config.segment_max`.
    pub fn with_config(shape: &[usize], config: &Config) -> Result<Self> {
        let segment_max = config.segment_max.max(1);

        let mut count: u128 = 1;
        for (dim, &size) in shape.iter().enumerate() {
            if size == 0 {
                return Err(TensorError::InvalidShape { dim });
            }
            count = count.saturating_mul(size as u128);
        }

        let capacity = (segment_max as u128 * segment_max as u128).min(usize::MAX as u128);
        if count > capacity {
            tracing::warn!(
                ?shape,
                count = %count,
                capacity = %capacity,
                "tensor shape exceeds segmented capacity"
            );
            return Err(TensorError::CapacityExceeded { count, capacity });
        }
        let len = count as usize;

        Ok(Self {
            shape: shape.to_vec(),
            strides: compute_strides(shape),
            len,
            segment_max,
            rollover: len > segment_max,
        })
    }

    /// Index of a rank-0 tensor holding one element.
    pub fn scalar() -> Self {
        Self {
            shape: Vec::new(),
            strides: Vec::new(),
            len: 1,
            segment_max: SEGMENT_MAX,
            rollover: false,
        }
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of dimensions (0 for a scalar).
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: every dimension has size ≥ 1.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn segment_max(&self) -> usize {
        self.segment_max
    }

    /// True when the cells span more than one segment.
    #[inline]
    pub fn is_rollover(&self) -> bool {
        self.rollover
    }

    /// Number of storage segments.
    pub fn segment_count(&self) -> usize {
        if self.rollover {
            self.len.div_ceil(self.segment_max)
        } else {
            1
        }
    }

    /// Length of segment `segment`; every segment but the last is full.
    pub fn segment_len(&self, segment: usize) -> usize {
        if !self.rollover {
            return self.len;
        }
        let count = self.segment_count();
        if segment + 1 < count {
            self.segment_max
        } else {
            self.len - self.segment_max * (count - 1)
        }
    }

    /// Linear position of `coord`. Performs no validation.
    #[inline]
    pub fn linear_position<C: Coordinate + ?Sized>(&self, coord: &C) -> usize {
        coord.linear(&self.strides)
    }

    /// Physical location of `coord`. Performs no validation.
    #[inline]
    pub fn point_for<C: Coordinate + ?Sized>(&self, coord: &C) -> Point {
        self.point_for_linear(coord.linear(&self.strides))
    }

    /// Physical location of a linear position. Performs no validation.
    #[inline]
    pub fn point_for_linear(&self, linear: usize) -> Point {
        if self.rollover {
            Point {
                segment: linear / self.segment_max,
                offset: linear % self.segment_max,
            }
        } else {
            Point {
                segment: 0,
                offset: linear,
            }
        }
    }

    /// Validate `coord`, then return its physical location.
    pub fn checked_point_for<C: Coordinate + ?Sized>(&self, coord: &C) -> Result<Point> {
        self.validate(coord)?;
        Ok(self.point_for(coord))
    }

    /// Check that `coord` has one component per dimension, each in range.
    pub fn validate<C: Coordinate + ?Sized>(&self, coord: &C) -> Result<()> {
        let components = coord.components();
        if components.len() != self.shape.len() {
            return Err(TensorError::RankMismatch {
                expected: self.shape.len(),
                actual: components.len(),
            });
        }
        for (dim, (&index, &size)) in components.iter().zip(&self.shape).enumerate() {
            if index >= size {
                return Err(TensorError::IndexOutOfBounds { dim, index, size });
            }
        }
        Ok(())
    }

    /// Inverse of [`linear_position`](Self::linear_position).
    pub fn coordinate_for(&self, linear: usize) -> Vec<usize> {
        let mut rest = linear;
        self.strides
            .iter()
            .map(|&stride| {
                let c = rest / stride;
                rest %= stride;
                c
            })
            .collect()
    }

    /// True when both indices describe the same shape.
    #[inline]
    pub fn same_shape(&self, other: &Index) -> bool {
        self.shape == other.shape
    }
}

/// Row-major strides: the last dimension varies fastest.
pub(crate) fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

pub(crate) fn ensure_same_shape(a: &[usize], b: &[usize]) -> Result<()> {
    if a != b {
        return Err(TensorError::ShapeMismatch(a.to_vec(), b.to_vec()));
    }
    Ok(())
}
