//! Dense N-dimensional tensors over segmented storage.
//!
//! A [`Tensor`] stores its cells in one or more contiguous segments. When the
//! element count exceeds the configured segment limit ([`SEGMENT_MAX`] by
//! default) the cells roll over into additional segments, so a single tensor
//! can hold up to `SEGMENT_MAX²` elements.
//!
//! # Core Types
//!
//! - [`Index`]: Row-major coordinate addressing, mapping a coordinate to a
//!   `(segment, offset)` [`Point`]
//! - [`Tensor`]: Segmented store with checked and unchecked cell accessors
//! - [`ReferenceTensor`]: Zero-copy reshape views (expand, collapse,
//!   unmodifiable, sub-tensor)
//!
//! # Bulk Operations
//!
//! - [`fill`], [`fill_with`], [`try_fill`], [`fill_value`]: Assign every cell
//!   from a coordinate function, in parallel above a size threshold
//! - [`copy_to`], [`cast_to`]: Copy between equally shaped tensors
//! - [`copy_of`], [`cast_copy_of`]: Clone into a tensor built by a [`TensorFactory`]
//! - [`equals`], [`almost_equals`]: Structural and approximate equality
//!
//! # Example
//!
//! ```rust
//! use segtensor::{equals, fill, Tensor};
//!
//! let mut a = Tensor::<i32>::new(&[2, 2]).unwrap();
//! fill(&mut a, |c| (c[0] * 2 + c[1] + 1) as i32);
//!
//! let b = Tensor::from_vec(&[2, 2], vec![1, 2, 3, 4]).unwrap();
//! assert!(equals(&a, &b));
//! assert_eq!(a.get(&[1, 0]).unwrap(), 3);
//! ```
//!
//! # Parallelism
//!
//! With the default `parallel` feature, bulk fills above
//! [`Config::sequential_threshold`] cells run on the rayon thread pool using a
//! divide-and-conquer split of the linear range. Wrap calls in
//! `rayon::ThreadPool::install` to use a dedicated pool.

mod config;
mod copy;
mod element;
mod equality;
mod fill;
mod index;
mod maybe_sync;
mod odometer;
mod tensor;
mod threading;
pub mod view;

// ============================================================================
// Configuration and elements
// ============================================================================
pub use config::Config;
pub use element::{ApproxElement, Element, ElementKind};

// ============================================================================
// Addressing and storage
// ============================================================================
pub use index::{Coordinate, Index, Point};
pub use odometer::Odometer;
pub use tensor::{DenseFactory, Tensor, TensorFactory, TensorLike};

// ============================================================================
// Bulk operations
// ============================================================================
pub use copy::{cast_copy_of, cast_to, copy_of, copy_of_with, copy_to, copy_to_with};
pub use equality::{almost_equals, almost_equals_with, equals};
pub use fill::{fill, fill_value, fill_with, try_fill, try_fill_with};

// ============================================================================
// Views
// ============================================================================
pub use view::{OuterIter, ReferenceTensor};

pub use maybe_sync::{MaybeSend, MaybeSendSync, MaybeSync};

// ============================================================================
// Constants
// ============================================================================

/// Largest number of elements a single storage segment may hold.
///
/// Matches the 32-bit signed maximum so addressing is identical to
/// platforms whose arrays are limited to that length.
pub const SEGMENT_MAX: usize = i32::MAX as usize;

/// Element count at or below which bulk fills run sequentially.
pub const DEFAULT_SEQUENTIAL_THRESHOLD: usize = 5_000;

/// Number of forked-but-not-started subtasks above which a fill stops splitting.
pub const DEFAULT_SURPLUS_QUEUED_TASKS: usize = 3;

/// Maximum rank that stays on the stack in coordinate buffers.
pub(crate) const INLINE_RANK: usize = 9;

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur during tensor construction, access, and bulk operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TensorError {
    /// Tensor shapes differ where equal shapes are required.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Coordinate length does not match the tensor rank.
    #[error("coordinate has {actual} components but rank is {expected}")]
    RankMismatch { expected: usize, actual: usize },

    /// Coordinate component lies outside `[0, size)` for its dimension.
    #[error("index {index} out of bounds for dimension {dim} of size {size}")]
    IndexOutOfBounds {
        dim: usize,
        index: usize,
        size: usize,
    },

    /// A dimension of the requested shape has size zero.
    #[error("dimension {dim} has size 0")]
    InvalidShape { dim: usize },

    /// Total element count exceeds the square of the segment limit.
    #[error("element count {count} exceeds capacity {capacity}")]
    CapacityExceeded { count: u128, capacity: u128 },

    /// Collapse requested on a dimension whose size is not 1.
    #[error("dimension {dim} has size {size} and cannot be collapsed")]
    NonCollapsibleDimension { dim: usize, size: usize },

    /// Dimension index out of range for the tensor rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// Operation not permitted on this tensor.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Result type for tensor operations.
pub type Result<T> = std::result::Result<T, TensorError>;
