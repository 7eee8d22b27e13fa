//! Run-wide engine settings.
use std::path::{Path, PathBuf};

use crate::exec::CommandEnv;

/// What to do when a task is reached again while it is still executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CyclePolicy {
    /// Treat the re-entered task as already satisfied and continue.
    #[default]
    Skip,
    /// Abort the run with a cycle error.
    Error,
}

/// How hard failures (anything other than "destination already exists")
/// affect the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first hard failure.
    #[default]
    Abort,
    /// Record the failure, keep going, and fail the run at the end.
    KeepGoing,
}

/// Behaviour switches for a run.
///
/// Plain named booleans; overlapping combinations are resolved by the derived
/// accessors rather than by bit arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Flags {
    /// Replace (or, when unlinking, remove) entries that are in the way.
    pub clobber: bool,
    /// Create missing parent directories of link destinations.
    pub force_create_parents: bool,
    /// Log every decision.
    pub verbose: bool,
    /// Do not run task commands.
    pub skip_commands: bool,
    /// Do not touch links.
    pub skip_links: bool,
    /// Remove previously created links instead of creating them.
    pub unlink: bool,
    /// Report what would change without changing anything.
    pub dry_run: bool,
    /// Reject relative paths that escape their root.
    pub confine_paths: bool,
    /// Treat "destination already exists" as a hard failure.
    pub strict: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            clobber: false,
            force_create_parents: true,
            verbose: false,
            skip_commands: false,
            skip_links: false,
            unlink: false,
            dry_run: false,
            confine_paths: false,
            strict: false,
        }
    }
}

impl Flags {
    /// Commands are skipped when requested explicitly or when unlinking.
    #[must_use]
    pub const fn effective_skip_commands(&self) -> bool {
        self.skip_commands || self.unlink
    }
}

/// Immutable settings shared by every component for one run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Absolute source root (link sources are relative to it).
    pub src_dir: PathBuf,
    /// Absolute destination root (link destinations are relative to it).
    pub dest_dir: PathBuf,
    /// Config file the graph was loaded from, if any.
    pub config_path: Option<PathBuf>,
    /// Name of the task the run started from.
    pub root_task: String,
    /// Active variant, if any.
    pub variant: Option<String>,
    /// Behaviour switches.
    pub flags: Flags,
    /// Handling of re-entered tasks.
    pub cycle_policy: CyclePolicy,
    /// Handling of hard failures.
    pub failure_policy: FailurePolicy,
}

impl EngineConfig {
    /// Create a config with default flags and policies.
    #[must_use]
    pub fn new(src_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            src_dir: src_dir.into(),
            dest_dir: dest_dir.into(),
            config_path: None,
            root_task: "default".to_string(),
            variant: None,
            flags: Flags::default(),
            cycle_policy: CyclePolicy::default(),
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Source root.
    #[must_use]
    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    /// Destination root.
    #[must_use]
    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Active variant name, if any.
    #[must_use]
    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// The `HM_*` variables every command sees.
    #[must_use]
    pub fn command_env(&self) -> CommandEnv {
        CommandEnv::new()
            .with(
                "HM_CONFIG",
                self.config_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            )
            .with("HM_TASK", self.root_task.as_str())
            .with("HM_SRC", self.src_dir.display().to_string())
            .with("HM_DEST", self.dest_dir.display().to_string())
            .with("HM_VARIANT", self.variant.as_deref().unwrap_or_default())
    }
}
