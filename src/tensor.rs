//! Segmented dense storage.
//!
//! A [`Tensor`] owns `Index::segment_count()` boxed slices. Segments are
//! allocated once at construction and never resized; cell access is one
//! address computation plus one slice dereference.

use std::marker::PhantomData;

use crate::config::Config;
use crate::element::Element;
use crate::fill::fill;
use crate::index::{Coordinate, Index, Point};
use crate::maybe_sync::MaybeSync;
use crate::threading::SendPtr;
use crate::{Result, TensorError};

/// Read access shared by owned tensors and reference views.
///
/// Bulk operations take their sources through this trait, so copy and
/// equality accept either.
pub trait TensorLike {
    type Elem: Element;

    /// Addressing scheme describing this tensor's shape.
    fn index(&self) -> &Index;

    #[inline]
    fn shape(&self) -> &[usize] {
        self.index().shape()
    }

    #[inline]
    fn rank(&self) -> usize {
        self.index().rank()
    }

    /// Checked cell read.
    fn cell(&self, coord: &[usize]) -> Result<&Self::Elem> {
        self.index().validate(coord)?;
        Ok(unsafe { self.cell_unchecked(coord) })
    }

    /// Cell read without validation.
    ///
    /// # Safety
    /// `coord` must have one in-range component per dimension.
    unsafe fn cell_unchecked(&self, coord: &[usize]) -> &Self::Elem;
}

/// Dense N-dimensional tensor of a single element kind.
#[derive(Debug, Clone)]
pub struct Tensor<T> {
    index: Index,
    segments: Vec<Box<[T]>>,
}

impl<T: Element> Tensor<T> {
    /// Allocate a tensor with every cell set to `T::default()`.
    pub fn new(shape: &[usize]) -> Result<Self> {
        Self::with_config(shape, None, &Config::default())
    }

    /// Allocate a tensor with every cell set to `value`.
    pub fn with_value(shape: &[usize], value: T) -> Result<Self> {
        Self::with_config(shape, Some(value), &Config::default())
    }

    /// Allocate a tensor using `config.segment_max` for its layout.
    ///
    /// Cells start as `default`, or `T::default()` when none is given.
    pub fn with_config(shape: &[usize], default: Option<T>, config: &Config) -> Result<Self> {
        let index = Index::with_config(shape, config)?;
        let value = default.unwrap_or_default();
        let segments = (0..index.segment_count())
            .map(|s| vec![value.clone(); index.segment_len(s)].into_boxed_slice())
            .collect::<Vec<_>>();
        tracing::trace!(
            ?shape,
            segments = segments.len(),
            kind = ?T::KIND,
            "allocated tensor"
        );
        Ok(Self { index, segments })
    }

    /// Rank-0 tensor holding `value`.
    pub fn scalar(value: T) -> Self {
        Self {
            index: Index::scalar(),
            segments: vec![vec![value].into_boxed_slice()],
        }
    }

    /// Build a tensor from row-major `data`.
    ///
    /// # Errors
    /// [`TensorError::ShapeMismatch`] if `data.len()` differs from the
    /// element count of `shape`.
    pub fn from_vec(shape: &[usize], data: Vec<T>) -> Result<Self> {
        Self::from_vec_with_config(shape, data, &Config::default())
    }

    pub fn from_vec_with_config(shape: &[usize], data: Vec<T>, config: &Config) -> Result<Self> {
        let index = Index::with_config(shape, config)?;
        if data.len() != index.len() {
            return Err(TensorError::ShapeMismatch(shape.to_vec(), vec![data.len()]));
        }
        let segments = if index.is_rollover() {
            let mut values = data.into_iter();
            (0..index.segment_count())
                .map(|s| values.by_ref().take(index.segment_len(s)).collect())
                .collect()
        } else {
            vec![data.into_boxed_slice()]
        };
        Ok(Self { index, segments })
    }

    /// Allocate a tensor and fill it with `f(coordinate)`.
    pub fn from_fn<F>(shape: &[usize], f: F) -> Result<Self>
    where
        F: Fn(&[usize]) -> T + MaybeSync,
    {
        let mut tensor = Self::new(shape)?;
        fill(&mut tensor, f);
        Ok(tensor)
    }

    #[inline]
    pub fn index(&self) -> &Index {
        &self.index
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.index.shape()
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.index.rank()
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The storage segments in linear order.
    #[inline]
    pub fn segments(&self) -> &[Box<[T]>] {
        &self.segments
    }

    /// Get a cell by value.
    ///
    /// # Errors
    /// [`TensorError::RankMismatch`] or [`TensorError::IndexOutOfBounds`]
    /// if `coord` is invalid.
    #[inline]
    pub fn get<C: Coordinate + ?Sized>(&self, coord: &C) -> Result<T> {
        self.get_ref(coord).cloned()
    }

    /// Get a reference to a cell.
    #[inline]
    pub fn get_ref<C: Coordinate + ?Sized>(&self, coord: &C) -> Result<&T> {
        let point = self.index.checked_point_for(coord)?;
        Ok(unsafe { self.at_point(point) })
    }

    /// Get a cell without validating the coordinate.
    ///
    /// # Safety
    /// `coord` must have one in-range component per dimension.
    #[inline]
    pub unsafe fn get_unchecked<C: Coordinate + ?Sized>(&self, coord: &C) -> T {
        self.at_point(self.index.point_for(coord)).clone()
    }

    /// Get a mutable reference to a cell.
    #[inline]
    pub fn get_mut<C: Coordinate + ?Sized>(&mut self, coord: &C) -> Result<&mut T> {
        let point = self.index.checked_point_for(coord)?;
        Ok(unsafe { self.at_point_mut(point) })
    }

    /// Set a cell. Validation happens before any mutation.
    #[inline]
    pub fn set<C: Coordinate + ?Sized>(&mut self, coord: &C, value: T) -> Result<()> {
        *self.get_mut(coord)? = value;
        Ok(())
    }

    /// Set a cell without validating the coordinate.
    ///
    /// # Safety
    /// `coord` must have one in-range component per dimension.
    #[inline]
    pub unsafe fn set_unchecked<C: Coordinate + ?Sized>(&mut self, coord: &C, value: T) {
        let point = self.index.point_for(coord);
        *self.at_point_mut(point) = value;
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.segments.iter().flat_map(|s| s.iter())
    }

    /// Copy all cells into a row-major `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    #[inline]
    pub(crate) unsafe fn at_point(&self, point: Point) -> &T {
        self.segments
            .get_unchecked(point.segment)
            .get_unchecked(point.offset)
    }

    #[inline]
    pub(crate) unsafe fn at_point_mut(&mut self, point: Point) -> &mut T {
        self.segments
            .get_unchecked_mut(point.segment)
            .get_unchecked_mut(point.offset)
    }

    #[inline]
    pub(crate) unsafe fn at_linear(&self, linear: usize) -> &T {
        self.at_point(self.index.point_for_linear(linear))
    }

    #[inline]
    pub(crate) unsafe fn set_linear_unchecked(&mut self, linear: usize, value: T) {
        let point = self.index.point_for_linear(linear);
        *self.at_point_mut(point) = value;
    }

    /// Shared writer over all segments for disjoint parallel writes.
    pub(crate) fn writer(&mut self) -> SegmentWriter<'_, T> {
        let index = &self.index;
        let segments = self
            .segments
            .iter_mut()
            .map(|s| SendPtr(s.as_mut_ptr()))
            .collect();
        SegmentWriter {
            index,
            segments,
            _marker: PhantomData,
        }
    }
}

impl<T: Element> TensorLike for Tensor<T> {
    type Elem = T;

    #[inline]
    fn index(&self) -> &Index {
        &self.index
    }

    #[inline]
    unsafe fn cell_unchecked(&self, coord: &[usize]) -> &T {
        self.at_point(self.index.point_for(coord))
    }
}

impl<T: Element> PartialEq for Tensor<T> {
    fn eq(&self, other: &Self) -> bool {
        crate::equality::equals(self, other)
    }
}

/// Raw write handle over a tensor's segments.
///
/// Holds the tensor's exclusive borrow for its lifetime. Concurrent writers
/// must target disjoint linear positions.
pub(crate) struct SegmentWriter<'a, T> {
    index: &'a Index,
    segments: Vec<SendPtr<T>>,
    _marker: PhantomData<&'a mut [T]>,
}

unsafe impl<T: Send> Send for SegmentWriter<'_, T> {}
unsafe impl<T: Send> Sync for SegmentWriter<'_, T> {}

impl<T> SegmentWriter<'_, T> {
    /// Overwrite the cell at `linear`, dropping the previous value.
    ///
    /// # Safety
    /// `linear` must be below the element count and no other thread may
    /// access the same cell concurrently.
    #[inline]
    pub(crate) unsafe fn write(&self, linear: usize, value: T) {
        let point = self.index.point_for_linear(linear);
        let base = self.segments.get_unchecked(point.segment).as_ptr();
        *base.add(point.offset) = value;
    }
}

/// Builds destination tensors for copy-of operations.
pub trait TensorFactory {
    /// Create a tensor of `shape` whose cells start as `default`
    /// (or the element default).
    fn create<T: Element>(&self, shape: &[usize], default: Option<T>) -> Result<Tensor<T>>;
}

/// Factory for [`Tensor`]s laid out with a fixed [`Config`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseFactory {
    config: Config,
}

impl DenseFactory {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl TensorFactory for DenseFactory {
    fn create<T: Element>(&self, shape: &[usize], default: Option<T>) -> Result<Tensor<T>> {
        Tensor::with_config(shape, default, &self.config)
    }
}
