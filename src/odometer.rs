//! Row-major coordinate enumeration.

use smallvec::SmallVec;

use crate::INLINE_RANK;

type CoordVec = SmallVec<[usize; INLINE_RANK]>;

/// Stateful coordinate enumerator.
///
/// Increments the last dimension fastest and carries into higher dimensions
/// on overflow. Advancing past the final coordinate wraps to all zeros.
/// Cloning yields an independent enumerator at the same position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Odometer {
    shape: CoordVec,
    coord: CoordVec,
}

impl Odometer {
    /// Enumerator positioned at the all-zero coordinate.
    pub fn new(shape: &[usize]) -> Self {
        Self {
            shape: SmallVec::from_slice(shape),
            coord: SmallVec::from_elem(0, shape.len()),
        }
    }

    /// Enumerator positioned at row-major linear position `linear`.
    pub fn at(shape: &[usize], linear: usize) -> Self {
        let mut coord: CoordVec = SmallVec::from_elem(0, shape.len());
        let mut rest = linear;
        for (c, &size) in coord.iter_mut().zip(shape).rev() {
            *c = rest % size;
            rest /= size;
        }
        Self {
            shape: SmallVec::from_slice(shape),
            coord,
        }
    }

    #[inline]
    pub fn current(&self) -> &[usize] {
        &self.coord
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Step to the next coordinate. Returns false when the step wrapped
    /// around to all zeros.
    #[inline]
    pub fn advance(&mut self) -> bool {
        for (c, &size) in self.coord.iter_mut().zip(&self.shape).rev() {
            *c += 1;
            if *c < size {
                return true;
            }
            *c = 0;
        }
        false
    }

    /// Move back to the all-zero coordinate.
    pub fn reset(&mut self) {
        self.coord.iter_mut().for_each(|c| *c = 0);
    }
}
