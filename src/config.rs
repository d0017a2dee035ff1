//! Tunable limits for storage layout and bulk-operation scheduling.

use std::env;
use std::sync::OnceLock;

use crate::{DEFAULT_SEQUENTIAL_THRESHOLD, DEFAULT_SURPLUS_QUEUED_TASKS, SEGMENT_MAX};

static GLOBAL: OnceLock<Config> = OnceLock::new();

/// Storage and scheduling limits.
///
/// The segment limit decides how a tensor's cells are split across storage
/// segments. The threshold and surplus bound steer the parallel fill
/// splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of elements per storage segment.
    pub segment_max: usize,
    /// Element count at or below which a fill range runs sequentially.
    pub sequential_threshold: usize,
    /// Stop splitting once this many forked halves are still waiting to start.
    pub surplus_queued_tasks: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segment_max: SEGMENT_MAX,
            sequential_threshold: DEFAULT_SEQUENTIAL_THRESHOLD,
            surplus_queued_tasks: DEFAULT_SURPLUS_QUEUED_TASKS,
        }
    }
}

impl Config {
    /// Process-wide configuration used by the non-`_with` entry points.
    ///
    /// Initialised once from `SEGTENSOR_SEQUENTIAL_THRESHOLD` and
    /// `SEGTENSOR_SURPLUS_TASKS` when they hold positive integers. The segment
    /// limit always keeps its default.
    pub fn global() -> &'static Config {
        GLOBAL.get_or_init(Config::from_env)
    }

    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Some(threshold) = read_usize("SEGTENSOR_SEQUENTIAL_THRESHOLD") {
            config.sequential_threshold = threshold;
        }
        if let Some(surplus) = read_usize("SEGTENSOR_SURPLUS_TASKS") {
            config.surplus_queued_tasks = surplus;
        }
        config
    }

    /// Set the segment limit. Values below 1 are raised to 1.
    pub fn with_segment_max(mut self, segment_max: usize) -> Self {
        self.segment_max = segment_max.max(1);
        self
    }

    pub fn with_sequential_threshold(mut self, threshold: usize) -> Self {
        self.sequential_threshold = threshold;
        self
    }

    pub fn with_surplus_queued_tasks(mut self, surplus: usize) -> Self {
        self.surplus_queued_tasks = surplus;
        self
    }

    /// Largest element count a tensor may hold under this segment limit.
    #[inline]
    pub fn capacity(&self) -> u128 {
        let max = self.segment_max as u128;
        max * max
    }
}

fn read_usize(key: &str) -> Option<usize> {
    match env::var(key) {
        Ok(value) => match value.trim().parse::<usize>() {
            Ok(parsed) if parsed > 0 => Some(parsed),
            _ => {
                tracing::warn!(key, value = %value, "ignoring invalid configuration override");
                None
            }
        },
        Err(_) => None,
    }
}
