//! Divide-and-conquer parallel execution over a linear range.
//!
//! The range `[start, end)` is halved recursively with `rayon::join`. A half
//! keeps splitting while it is longer than the sequential threshold and fewer
//! than `surplus_queued_tasks` forked halves of the same operation are still
//! waiting for a worker. Leaves receive disjoint sub-ranges.

#[cfg(feature = "parallel")]
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::Config;
use crate::maybe_sync::{MaybeSend, MaybeSync};

/// A raw pointer wrapper that is `Send` + `Sync`.
///
/// # Safety
/// The pointed-to data must outlive the parallel operation and concurrent
/// users must write to disjoint cells.
pub(crate) struct SendPtr<T>(pub(crate) *mut T);

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

unsafe impl<T> Send for SendPtr<T> {}
unsafe impl<T> Sync for SendPtr<T> {}

impl<T> SendPtr<T> {
    #[inline]
    pub(crate) fn as_ptr(self) -> *mut T {
        self.0
    }
}

/// Number of worker threads bulk operations may use.
#[inline]
pub(crate) fn available_threads() -> usize {
    #[cfg(feature = "parallel")]
    {
        rayon::current_num_threads()
    }
    #[cfg(not(feature = "parallel"))]
    {
        1
    }
}

/// True when a range of `len` elements should be split across threads.
#[inline]
pub(crate) fn should_parallelize(len: usize, config: &Config) -> bool {
    len > config.sequential_threshold && config.surplus_queued_tasks > 0 && available_threads() > 1
}

/// Run `leaf` over disjoint sub-ranges covering `[start, end)`.
///
/// Every leaf runs to completion; the first error in range order is
/// returned. Without the `parallel` feature the whole range is one leaf.
pub(crate) fn for_each_range<E, F>(
    start: usize,
    end: usize,
    config: &Config,
    leaf: &F,
) -> Result<(), E>
where
    E: MaybeSend,
    F: Fn(usize, usize) -> Result<(), E> + MaybeSync,
{
    #[cfg(feature = "parallel")]
    {
        let queued = AtomicUsize::new(0);
        split_range(
            start,
            end,
            config.sequential_threshold.max(1),
            config.surplus_queued_tasks,
            &queued,
            leaf,
        )
    }
    #[cfg(not(feature = "parallel"))]
    {
        let _ = config;
        leaf(start, end)
    }
}

#[cfg(feature = "parallel")]
fn split_range<E, F>(
    start: usize,
    end: usize,
    threshold: usize,
    surplus: usize,
    queued: &AtomicUsize,
    leaf: &F,
) -> Result<(), E>
where
    E: Send,
    F: Fn(usize, usize) -> Result<(), E> + Sync,
{
    let len = end - start;
    if len <= threshold || queued.load(Ordering::Relaxed) >= surplus {
        tracing::trace!(start, end, "leaf range");
        return leaf(start, end);
    }

    let mid = start + len / 2;
    queued.fetch_add(1, Ordering::Relaxed);
    let (left, right) = rayon::join(
        || split_range(start, mid, threshold, surplus, queued, leaf),
        || {
            // the forked half has started
            queued.fetch_sub(1, Ordering::Relaxed);
            split_range(mid, end, threshold, surplus, queued, leaf)
        },
    );
    left?;
    right?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collect_ranges(len: usize, config: &Config) -> Vec<(usize, usize)> {
        let ranges = Mutex::new(Vec::new());
        for_each_range::<(), _>(0, len, config, &|s, e| {
            ranges.lock().unwrap().push((s, e));
            Ok(())
        })
        .unwrap();
        let mut ranges = ranges.into_inner().unwrap();
        ranges.sort_unstable();
        ranges
    }

    #[test]
    fn test_ranges_cover_exactly_once() {
        let config = Config::default()
            .with_sequential_threshold(7)
            .with_surplus_queued_tasks(64);
        let ranges = collect_ranges(1000, &config);
        let mut next = 0;
        for &(s, e) in &ranges {
            assert_eq!(s, next);
            assert!(e > s);
            next = e;
        }
        assert_eq!(next, 1000);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_leaves_respect_threshold() {
        let config = Config::default()
            .with_sequential_threshold(10)
            .with_surplus_queued_tasks(usize::MAX);
        let ranges = collect_ranges(1000, &config);
        assert!(ranges.iter().all(|(s, e)| e - s <= 10));
        assert!(ranges.len() >= 100);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_zero_surplus_never_splits() {
        let config = Config::default()
            .with_sequential_threshold(1)
            .with_surplus_queued_tasks(0);
        assert_eq!(collect_ranges(500, &config), vec![(0, 500)]);
    }

    #[test]
    fn test_first_error_in_range_order() {
        let config = Config::default()
            .with_sequential_threshold(4)
            .with_surplus_queued_tasks(64);
        let result = for_each_range(0, 64, &config, &|s, _e| {
            if s >= 16 {
                Err(s)
            } else {
                Ok(())
            }
        });
        #[cfg(feature = "parallel")]
        assert_eq!(result, Err(16));
        #[cfg(not(feature = "parallel"))]
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_should_parallelize() {
        let config = Config::default().with_sequential_threshold(100);
        assert!(!should_parallelize(100, &config));
        assert_eq!(should_parallelize(101, &config), available_threads() > 1);
    }

    #[test]
    fn test_send_ptr_round_trip() {
        let mut data = [1u8, 2, 3];
        let ptr = SendPtr(data.as_mut_ptr());
        let copy = ptr;
        unsafe { *copy.as_ptr().add(2) = 9 };
        assert_eq!(data, [1, 2, 9]);
    }
}
