//! Idempotent resource primitives (check + apply pattern).
//!
//! A link is inspected first ([`ResourceState`]) and only then changed; the
//! result of one application is a [`LinkOutcome`].
pub mod command;
pub mod helpers;
pub mod link;
pub mod path;

use crate::error::LinkError;

/// State of a link destination relative to its desired state.
///
/// # Examples
///
/// ```
/// use homemaker::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let wrong = ResourceState::Incorrect { current: "points to /other".into() };
///
/// assert_ne!(missing, ResourceState::Correct);
/// assert_ne!(wrong, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Nothing occupies the destination.
    Missing,
    /// The destination already is the desired link (or identical copy).
    Correct,
    /// Something else occupies the destination.
    Incorrect {
        /// What is there instead.
        current: String,
    },
}

/// Result of applying one link.
#[derive(Debug)]
pub enum LinkOutcome {
    /// The destination was absent and has been created.
    Created,
    /// Nothing was done: already correct, nothing to remove, or links are
    /// disabled.
    SkippedExists,
    /// Something else was in the way and has been replaced.
    Replaced,
    /// The destination has been removed (unlink mode).
    Removed,
    /// The link could not be applied.
    Failed(LinkError),
}

impl LinkOutcome {
    /// Whether the filesystem was (or, in a dry run, would be) changed.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Replaced | Self::Removed)
    }

    /// The failure, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&LinkError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Whether this is a failure that only skips the affected link.
    #[must_use]
    pub const fn is_soft_failure(&self) -> bool {
        match self {
            Self::Failed(e) => e.is_soft(),
            _ => false,
        }
    }

    /// Short verb for log lines.
    #[must_use]
    pub const fn label(&self, dry_run: bool) -> &'static str {
        match (self, dry_run) {
            (Self::Created, false) => "created",
            (Self::Created, true) => "would create",
            (Self::Replaced, false) => "replaced",
            (Self::Replaced, true) => "would replace",
            (Self::Removed, false) => "removed",
            (Self::Removed, true) => "would remove",
            (Self::SkippedExists, _) => "skipped (exists)",
            (Self::Failed(_), _) => "failed",
        }
    }
}
