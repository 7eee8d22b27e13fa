//! Shared execution context handed to the task executor.
use std::path::Path;
use std::sync::Arc;

use crate::config::engine::EngineConfig;
use crate::exec::{CommandEnv, Executor};
use crate::logging::Log;

use super::graph::TaskGraph;

/// Shared, read-only context for one run.
pub struct Context {
    /// Run-wide settings.
    pub config: EngineConfig,
    /// The tasks available to the run.
    pub graph: TaskGraph,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// `HM_*` variables every command sees.
    pub env: CommandEnv,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("graph", &format_args!("<{} tasks>", self.graph.len()))
            .field("log", &"<dyn Log>")
            .field("executor", &"<dyn Executor>")
            .field("env", &self.env)
            .finish()
    }
}

impl Context {
    /// Creates a new context; the command environment is derived from
    /// `config`.
    #[must_use]
    pub fn new(
        config: EngineConfig,
        graph: TaskGraph,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        let env = config.command_env();
        Self {
            config,
            graph,
            log,
            executor,
            env,
        }
    }

    /// Whether this run only reports changes.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.config.flags.dry_run
    }

    /// Source root; commands run here.
    #[must_use]
    pub fn src_dir(&self) -> &Path {
        self.config.src_dir()
    }

    /// Create a copy of this context with a different logger.
    #[must_use]
    pub fn with_log(&self, log: Arc<dyn Log>) -> Self {
        Self {
            config: self.config.clone(),
            graph: self.graph.clone(),
            log,
            executor: Arc::clone(&self.executor),
            env: self.env.clone(),
        }
    }
}
