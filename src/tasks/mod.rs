//! Named tasks, their execution context, and run statistics.
pub mod context;
pub mod executor;
pub mod graph;

pub use context::Context;
pub use executor::{ExecutionState, TaskExecutor};
pub use graph::{LinkMode, LinkSpec, ResolvedTask, Task, TaskGraph, Variant};

use crate::error::TaskError;
use crate::logging::TaskStatus;
use crate::resources::LinkOutcome;

/// Link outcome counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    /// Destinations created.
    pub created: u32,
    /// Destinations replaced (clobber).
    pub replaced: u32,
    /// Destinations removed (unlink).
    pub removed: u32,
    /// Links already in place or intentionally left alone.
    pub skipped: u32,
    /// Destinations occupied by something else (soft failures).
    pub conflicts: u32,
    /// Hard link failures.
    pub failed: u32,
}

impl LinkStats {
    /// Create a new empty stats counter.
    ///
    /// # Examples
    ///
    /// ```
    /// use homemaker::tasks::LinkStats;
    ///
    /// let stats = LinkStats::new();
    /// assert_eq!(stats.created, 0);
    /// assert_eq!(stats.total(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one outcome.
    pub fn record(&mut self, outcome: &LinkOutcome) {
        match outcome {
            LinkOutcome::Created => self.created += 1,
            LinkOutcome::Replaced => self.replaced += 1,
            LinkOutcome::Removed => self.removed += 1,
            LinkOutcome::SkippedExists => self.skipped += 1,
            LinkOutcome::Failed(e) if e.is_soft() => self.conflicts += 1,
            LinkOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Add another counter into this one.
    pub fn merge(&mut self, other: &Self) {
        self.created += other.created;
        self.replaced += other.replaced;
        self.removed += other.removed;
        self.skipped += other.skipped;
        self.conflicts += other.conflicts;
        self.failed += other.failed;
    }

    /// Number of outcomes counted.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.created + self.replaced + self.removed + self.skipped + self.conflicts + self.failed
    }

    /// Format the summary string, listing only non-zero counters.
    ///
    /// # Examples
    ///
    /// ```
    /// use homemaker::tasks::LinkStats;
    ///
    /// let stats = LinkStats { created: 2, skipped: 3, ..LinkStats::default() };
    /// assert_eq!(stats.summary(false), "2 created, 3 skipped");
    /// assert_eq!(stats.summary(true), "2 would create, 3 skipped");
    /// assert_eq!(LinkStats::new().summary(false), "no links");
    /// ```
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let (created, replaced, removed) = if dry_run {
            ("would create", "would replace", "would remove")
        } else {
            ("created", "replaced", "removed")
        };
        let parts: Vec<String> = [
            (self.created, created),
            (self.replaced, replaced),
            (self.removed, removed),
            (self.skipped, "skipped"),
            (self.conflicts, "existing"),
            (self.failed, "failed"),
        ]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{n} {label}"))
        .collect();

        if parts.is_empty() {
            "no links".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Aggregate result of one run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Link outcomes over all tasks.
    pub links: LinkStats,
    /// Commands that ran and exited zero.
    pub commands_run: u32,
    /// Commands not run (disabled, dry run, or failed under keep-going).
    pub commands_skipped: u32,
    /// Final status of every visited task, in completion order.
    pub statuses: Vec<(String, TaskStatus)>,
    /// Hard failures collected under the keep-going policy.
    pub failures: Vec<TaskError>,
}

impl RunReport {
    /// Whether the run finished without hard failures.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Status recorded for `task`, if it was visited.
    #[must_use]
    pub fn status_of(&self, task: &str) -> Option<TaskStatus> {
        self.statuses
            .iter()
            .find(|(name, _)| name == task)
            .map(|(_, status)| *status)
    }
}
