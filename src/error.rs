//! Domain-specific error types for the provisioning engine.
//!
//! Internal modules return typed errors (e.g. [`LinkError`], [`TaskError`])
//! while the command layer at the CLI boundary converts them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error types
//!
//! ```text
//! ConfigError  : reading and parsing the task document
//! TaskError    : unknown tasks, cycles, failed links/commands
//! ├── LinkFailed(LinkError)       : path resolution and link application
//! └── CommandFailed(CommandError) : spawning and exit status of shell commands
//! ```
//!
//! Only [`LinkError::AlreadyExists`] is *soft*: the run records it and moves
//! on to the next link. Everything else is *hard* and aborts the run unless
//! the keep-going failure policy is active.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the task document.
///
/// All of these are fatal and occur before any task runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not a valid task document.
    #[error("invalid task document {path}: {message}")]
    Parse {
        /// Path to the offending file.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// The config file extension is not one of the supported formats.
    #[error("unsupported config format: {0} (expected .toml, .json or .yml)")]
    UnsupportedFormat(PathBuf),

    /// The source directory could not be listed for the fallback task.
    #[error("cannot list source directory {path}: {source}")]
    SourceDir {
        /// Source directory path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors raised by the task graph and the task executor.
#[derive(Error, Debug)]
pub enum TaskError {
    /// A referenced task is not declared in the graph.
    #[error("unknown task '{0}'")]
    UnknownTask(String),

    /// A task was re-entered while still in progress and the cycle policy
    /// forbids it.
    #[error("task dependency cycle detected: {0}")]
    CyclicDependency(String),

    /// A link of the task failed with a hard error.
    #[error("task '{task}': {source}")]
    LinkFailed {
        /// Name of the task that owns the link.
        task: String,
        /// The link failure.
        source: LinkError,
    },

    /// A command of the task failed.
    #[error("task '{task}': {source}")]
    CommandFailed {
        /// Name of the task that owns the command.
        task: String,
        /// The command failure.
        source: CommandError,
    },
}

/// Errors raised while resolving or applying a single link.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The configured path is empty, cannot be expanded, or escapes its root.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The path as written in the configuration.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The destination's parent directory does not exist and parent creation
    /// is disabled.
    #[error("parent directory does not exist: {}", .0.display())]
    MissingParent(PathBuf),

    /// Something other than the expected link occupies the destination and
    /// clobbering is disabled.
    #[error("destination already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// The link source does not exist.
    #[error("source does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    /// A filesystem operation failed.
    #[error("{action} {}: {source}", .path.display())]
    Io {
        /// What was being attempted (e.g. `"create link"`).
        action: &'static str,
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl LinkError {
    /// Whether this failure only skips the affected link.
    #[must_use]
    pub const fn is_soft(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by the command runner.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The shell could not be started.
    #[error("failed to execute '{command}': {message}")]
    Spawn {
        /// The command string.
        command: String,
        /// Spawn failure description.
        message: String,
    },

    /// The command exited unsuccessfully.
    #[error("'{command}' failed (exit {code})")]
    Failed {
        /// The command string.
        command: String,
        /// Exit status, or `-1` if the process was killed by a signal.
        code: i32,
    },
}
