//! Zero-copy reference views over a [`Tensor`].
//!
//! A [`ReferenceTensor`] owns no cells. It borrows a source tensor and
//! remaps its own coordinates onto the source's:
//!
//! - expand: appends size-1 dimensions, ignored when reading the source
//! - collapse: drops size-1 dimensions, read as a constant 0
//! - slice: fixes the leading dimension at one index
//! - unmodifiable: same coordinates, every write fails
//!
//! Views compose, so `tensor.expand(2).collapse(&[3])` is again a single
//! remapping over the original tensor. Writes through a writable view land
//! in the source's segments.

use smallvec::SmallVec;

use crate::element::Element;
use crate::index::{Coordinate, Index};
use crate::tensor::{Tensor, TensorLike};
use crate::{Result, TensorError, INLINE_RANK};

/// Where a source dimension takes its coordinate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    /// Component `d` of the view coordinate.
    View(usize),
    /// A constant index.
    Fixed(usize),
}

#[derive(Debug)]
enum Backing<'a, T> {
    Shared(&'a Tensor<T>),
    Exclusive(&'a mut Tensor<T>),
}

/// A tensor-shaped view that reads and writes through to another tensor.
#[derive(Debug)]
pub struct ReferenceTensor<'a, T> {
    source: Backing<'a, T>,
    index: Index,
    /// One entry per source dimension.
    axes: SmallVec<[Axis; INLINE_RANK]>,
}

impl<'a, T: Element> ReferenceTensor<'a, T> {
    fn identity(source: Backing<'a, T>) -> Self {
        let tensor = match &source {
            Backing::Shared(t) => &**t,
            Backing::Exclusive(t) => &**t,
        };
        let index = tensor.index().clone();
        let axes = (0..index.rank()).map(Axis::View).collect();
        Self {
            source,
            index,
            axes,
        }
    }

    /// Read-only view with the same shape as `source`.
    pub fn unmodifiable_of(source: &'a Tensor<T>) -> Self {
        Self::identity(Backing::Shared(source))
    }

    /// Writable view with the same shape as `source`.
    pub fn writable_of(source: &'a mut Tensor<T>) -> Self {
        Self::identity(Backing::Exclusive(source))
    }

    #[inline]
    fn source(&self) -> &Tensor<T> {
        match &self.source {
            Backing::Shared(t) => t,
            Backing::Exclusive(t) => t,
        }
    }

    /// The view's own addressing scheme.
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

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True unless the view was created or wrapped as unmodifiable.
    #[inline]
    pub fn is_writable(&self) -> bool {
        matches!(self.source, Backing::Exclusive(_))
    }

    /// Linear position in the source for a view coordinate.
    #[inline]
    fn source_linear(&self, coord: &[usize]) -> usize {
        self.axes
            .iter()
            .zip(self.source().index().strides())
            .map(|(axis, &stride)| {
                let c = match *axis {
                    Axis::View(d) => coord[d],
                    Axis::Fixed(c) => c,
                };
                c * stride
            })
            .sum()
    }

    /// Get a cell by value.
    pub fn get<C: Coordinate + ?Sized>(&self, coord: &C) -> Result<T> {
        self.index.validate(coord)?;
        Ok(unsafe { self.get_unchecked(coord) })
    }

    /// Get a cell without validating the coordinate.
    ///
    /// # Safety
    /// `coord` must have one in-range component per view dimension.
    #[inline]
    pub unsafe fn get_unchecked<C: Coordinate + ?Sized>(&self, coord: &C) -> T {
        self.cell_unchecked(coord.components()).clone()
    }

    /// Set a cell in the source tensor.
    ///
    /// # Errors
    /// [`TensorError::Unsupported`] on an unmodifiable view; otherwise the
    /// coordinate errors of [`Index::validate`]. Nothing is written on error.
    pub fn set<C: Coordinate + ?Sized>(&mut self, coord: &C, value: T) -> Result<()> {
        if !self.is_writable() {
            return Err(TensorError::Unsupported("write through an unmodifiable view"));
        }
        self.index.validate(coord)?;
        unsafe { self.set_unchecked(coord, value) }
    }

    /// Set a cell without validating the coordinate.
    ///
    /// # Safety
    /// `coord` must have one in-range component per view dimension.
    ///
    /// # Errors
    /// [`TensorError::Unsupported`] on an unmodifiable view.
    pub unsafe fn set_unchecked<C: Coordinate + ?Sized>(
        &mut self,
        coord: &C,
        value: T,
    ) -> Result<()> {
        let linear = self.source_linear(coord.components());
        match &mut self.source {
            Backing::Exclusive(t) => {
                t.set_linear_unchecked(linear, value);
                Ok(())
            }
            Backing::Shared(_) => Err(TensorError::Unsupported(
                "write through an unmodifiable view",
            )),
        }
    }

    fn with_remap(self, shape: &[usize], remap: impl Fn(usize) -> Axis) -> Self {
        let axes = self
            .axes
            .iter()
            .map(|axis| match *axis {
                Axis::View(d) => remap(d),
                fixed => fixed,
            })
            .collect();
        let index = reshaped_index(&self.index, shape);
        Self {
            source: self.source,
            index,
            axes,
        }
    }

    /// Append `k` trailing dimensions of size 1.
    pub fn expand(self, k: usize) -> Self {
        let mut shape = self.shape().to_vec();
        shape.extend(std::iter::repeat(1).take(k));
        self.with_remap(&shape, Axis::View)
    }

    /// Remove the listed size-1 dimensions. An empty list removes nothing.
    ///
    /// # Errors
    /// [`TensorError::InvalidAxis`] for a dimension index ≥ rank,
    /// [`TensorError::NonCollapsibleDimension`] for a dimension whose size
    /// is not 1.
    pub fn collapse(self, dims: &[usize]) -> Result<Self> {
        let rank = self.rank();
        let mut removed: SmallVec<[bool; INLINE_RANK]> = SmallVec::from_elem(false, rank);
        for &dim in dims {
            if dim >= rank {
                return Err(TensorError::InvalidAxis { axis: dim, rank });
            }
            let size = self.shape()[dim];
            if size != 1 {
                return Err(TensorError::NonCollapsibleDimension { dim, size });
            }
            removed[dim] = true;
        }
        Ok(self.collapse_marked(&removed))
    }

    /// Remove every size-1 dimension.
    pub fn collapse_all(self) -> Self {
        let removed: SmallVec<[bool; INLINE_RANK]> =
            self.shape().iter().map(|&size| size == 1).collect();
        self.collapse_marked(&removed)
    }

    fn collapse_marked(self, removed: &[bool]) -> Self {
        let mut new_dim: SmallVec<[Option<usize>; INLINE_RANK]> = SmallVec::new();
        let mut shape = Vec::with_capacity(removed.len());
        for (d, &gone) in removed.iter().enumerate() {
            if gone {
                new_dim.push(None);
            } else {
                new_dim.push(Some(shape.len()));
                shape.push(self.shape()[d]);
            }
        }
        self.with_remap(&shape, |d| match new_dim[d] {
            Some(n) => Axis::View(n),
            None => Axis::Fixed(0),
        })
    }

    /// Rank R−1 view at `i` along the leading dimension.
    ///
    /// # Errors
    /// [`TensorError::InvalidAxis`] on a scalar view,
    /// [`TensorError::IndexOutOfBounds`] if `i` is past the leading dimension.
    pub fn slice_at(self, i: usize) -> Result<Self> {
        let rank = self.rank();
        if rank == 0 {
            return Err(TensorError::InvalidAxis { axis: 0, rank });
        }
        let size = self.shape()[0];
        if i >= size {
            return Err(TensorError::IndexOutOfBounds {
                dim: 0,
                index: i,
                size,
            });
        }
        let shape = self.shape()[1..].to_vec();
        Ok(self.with_remap(&shape, |d| {
            if d == 0 {
                Axis::Fixed(i)
            } else {
                Axis::View(d - 1)
            }
        }))
    }

    /// Drop write access. Reads still reflect the source.
    pub fn unmodifiable(self) -> Self {
        let source = match self.source {
            Backing::Exclusive(t) => Backing::Shared(t),
            shared => shared,
        };
        Self {
            source,
            index: self.index,
            axes: self.axes,
        }
    }

    /// Read-only view with the same remapping, borrowed from this one.
    pub fn as_unmodifiable(&self) -> ReferenceTensor<'_, T> {
        ReferenceTensor {
            source: Backing::Shared(self.source()),
            index: self.index.clone(),
            axes: self.axes.clone(),
        }
    }

    /// Rank R−1 sub-views over the leading dimension, in order.
    pub fn outer_iter(&self) -> OuterIter<'_, T> {
        OuterIter::new(self.source(), self.index.clone(), self.axes.clone())
    }
}

impl<T: Element> TensorLike for ReferenceTensor<'_, T> {
    type Elem = T;

    #[inline]
    fn index(&self) -> &Index {
        &self.index
    }

    #[inline]
    unsafe fn cell_unchecked(&self, coord: &[usize]) -> &T {
        self.source().at_linear(self.source_linear(coord))
    }
}

/// Index for a view shape. View shapes never hold more cells than their
/// source, so they always fit the source's segment limit.
fn reshaped_index(base: &Index, shape: &[usize]) -> Index {
    let config = crate::Config::default().with_segment_max(base.segment_max());
    match Index::with_config(shape, &config) {
        Ok(index) => index,
        Err(err) => unreachable!("view shape {shape:?} rejected: {err}"),
    }
}

/// Iterator over the leading-dimension sub-views of a tensor or view.
#[derive(Debug)]
pub struct OuterIter<'a, T> {
    source: &'a Tensor<T>,
    index: Index,
    axes: SmallVec<[Axis; INLINE_RANK]>,
    next: usize,
    end: usize,
}

impl<'a, T: Element> OuterIter<'a, T> {
    fn new(source: &'a Tensor<T>, index: Index, axes: SmallVec<[Axis; INLINE_RANK]>) -> Self {
        let end = index.shape().first().copied().unwrap_or(0);
        Self {
            source,
            index,
            axes,
            next: 0,
            end,
        }
    }
}

impl<'a, T: Element> Iterator for OuterIter<'a, T> {
    type Item = ReferenceTensor<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let i = self.next;
        self.next += 1;
        let parent = ReferenceTensor {
            source: Backing::Shared(self.source),
            index: self.index.clone(),
            axes: self.axes.clone(),
        };
        parent.slice_at(i).ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.next;
        (n, Some(n))
    }
}

impl<T: Element> ExactSizeIterator for OuterIter<'_, T> {}

// View constructors on owned tensors
impl<T: Element> Tensor<T> {
    /// Read-only view reflecting this tensor.
    pub fn unmodifiable(&self) -> ReferenceTensor<'_, T> {
        ReferenceTensor::unmodifiable_of(self)
    }

    /// Writable identity view.
    pub fn view_mut(&mut self) -> ReferenceTensor<'_, T> {
        ReferenceTensor::writable_of(self)
    }

    /// Read-only view with `k` trailing size-1 dimensions appended.
    pub fn expand(&self, k: usize) -> ReferenceTensor<'_, T> {
        self.unmodifiable().expand(k)
    }

    /// Writable view with `k` trailing size-1 dimensions appended.
    pub fn expand_mut(&mut self, k: usize) -> ReferenceTensor<'_, T> {
        self.view_mut().expand(k)
    }

    /// Read-only view with the listed size-1 dimensions removed.
    pub fn collapse(&self, dims: &[usize]) -> Result<ReferenceTensor<'_, T>> {
        self.unmodifiable().collapse(dims)
    }

    /// Writable view with the listed size-1 dimensions removed.
    pub fn collapse_mut(&mut self, dims: &[usize]) -> Result<ReferenceTensor<'_, T>> {
        self.view_mut().collapse(dims)
    }

    /// Read-only view with every size-1 dimension removed.
    pub fn collapse_all(&self) -> ReferenceTensor<'_, T> {
        self.unmodifiable().collapse_all()
    }

    /// Read-only rank R−1 view at `i` along the leading dimension.
    pub fn slice_at(&self, i: usize) -> Result<ReferenceTensor<'_, T>> {
        self.unmodifiable().slice_at(i)
    }

    /// Writable rank R−1 view at `i` along the leading dimension.
    pub fn slice_at_mut(&mut self, i: usize) -> Result<ReferenceTensor<'_, T>> {
        self.view_mut().slice_at(i)
    }

    /// Rank R−1 sub-views over the leading dimension, in order.
    pub fn outer_iter(&self) -> OuterIter<'_, T> {
        let axes = (0..self.rank()).map(Axis::View).collect();
        OuterIter::new(self, self.index().clone(), axes)
    }
}
