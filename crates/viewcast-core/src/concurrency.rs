//! Concurrency policy for projection aggregation
//!
//! A single policy governs how many field and sequence-element
//! resolutions may be in flight at once throughout a whole `project`
//! call tree. It is an explicit value threaded through every recursive
//! call, with a process-wide default for ergonomics.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-wide default limit. `0` = unlimited.
static CONCURRENCY_LIMIT: AtomicUsize = AtomicUsize::new(0);

/// How field and element resolutions are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    /// Start every resolution immediately.
    #[default]
    Unlimited,

    /// Complete each resolution before starting the next.
    Serial,

    /// At most this many resolutions in flight at once.
    Bounded(usize),
}

impl Concurrency {
    /// Map a numeric limit to a policy: `0` = unlimited, `1` = serial,
    /// `n` = bounded.
    pub fn from_limit(limit: usize) -> Self {
        match limit {
            0 => Concurrency::Unlimited,
            1 => Concurrency::Serial,
            n => Concurrency::Bounded(n),
        }
    }

    /// The process-wide default policy, as set by
    /// [`set_concurrency_limit`].
    pub fn current() -> Self {
        Self::from_limit(CONCURRENCY_LIMIT.load(Ordering::Relaxed))
    }
}

/// Set the process-wide default concurrency limit.
///
/// `1` forces serial aggregation, `n > 1` bounds parallelism to `n`,
/// `0` restores unlimited parallelism. The limit is read when a
/// top-level projection begins; changing it never affects resolutions
/// already in flight.
pub fn set_concurrency_limit(limit: usize) {
    CONCURRENCY_LIMIT.store(limit, Ordering::Relaxed);
}

/// Per-call options for a `project` invocation.
///
/// The default reads the process-wide concurrency limit at construction
/// time; nested projections inherit the options of the call that
/// spawned them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectOptions {
    /// Scheduling policy for field and element resolution.
    pub concurrency: Concurrency,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            concurrency: Concurrency::current(),
        }
    }
}

impl ProjectOptions {
    /// Options with an explicit concurrency policy.
    pub fn with_concurrency(concurrency: Concurrency) -> Self {
        Self { concurrency }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Concurrency::Unlimited)]
    #[case(1, Concurrency::Serial)]
    #[case(4, Concurrency::Bounded(4))]
    fn test_from_limit(#[case] limit: usize, #[case] expected: Concurrency) {
        assert_eq!(Concurrency::from_limit(limit), expected);
    }

    #[test]
    fn test_explicit_options() {
        let options = ProjectOptions::with_concurrency(Concurrency::Serial);
        assert_eq!(options.concurrency, Concurrency::Serial);
    }

    #[test]
    fn test_set_concurrency_limit_replaces_default() {
        set_concurrency_limit(3);
        assert_eq!(Concurrency::current(), Concurrency::Bounded(3));
        assert_eq!(
            ProjectOptions::default().concurrency,
            Concurrency::Bounded(3)
        );
        set_concurrency_limit(0);
        assert_eq!(Concurrency::current(), Concurrency::Unlimited);
    }
}
