//! Command runner: shell commands and task conditions over an [`Executor`].
use std::path::Path;

use crate::error::CommandError;
use crate::exec::{CommandEnv, ExecResult, Executor};
use crate::logging::Log;

/// Runs task commands through the platform shell in a fixed directory.
pub struct CommandRunner<'a> {
    executor: &'a dyn Executor,
    log: &'a dyn Log,
    dir: &'a Path,
}

impl std::fmt::Debug for CommandRunner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRunner")
            .field("executor", &"<dyn Executor>")
            .field("log", &"<dyn Log>")
            .field("dir", &self.dir)
            .finish()
    }
}

impl<'a> CommandRunner<'a> {
    /// Create a runner executing in `dir` (the source root).
    #[must_use]
    pub const fn new(executor: &'a dyn Executor, log: &'a dyn Log, dir: &'a Path) -> Self {
        Self { executor, log, dir }
    }

    /// Run `command` and require a zero exit status.
    ///
    /// Captured output goes to the log at debug level.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Spawn`] if the shell cannot be started, or
    /// [`CommandError::Failed`] on a non-zero exit.
    pub fn run(&self, command: &str, env: &CommandEnv) -> Result<ExecResult, CommandError> {
        self.log.debug(&format!("running: {command}"));
        let result = self.spawn(command, env)?;
        if result.success {
            Ok(result)
        } else {
            Err(CommandError::Failed {
                command: command.to_string(),
                code: result.code.unwrap_or(-1),
            })
        }
    }

    /// Run a condition command and report whether it exited zero.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Spawn`] if the shell cannot be started.
    pub fn check(&self, condition: &str, env: &CommandEnv) -> Result<bool, CommandError> {
        let result = self.spawn(condition, env)?;
        self.log.debug(&format!(
            "condition '{condition}' {}",
            if result.success { "passed" } else { "failed" }
        ));
        Ok(result.success)
    }

    fn spawn(&self, command: &str, env: &CommandEnv) -> Result<ExecResult, CommandError> {
        let result = self
            .executor
            .run_shell(command, self.dir, env)
            .map_err(|e| CommandError::Spawn {
                command: command.to_string(),
                message: format!("{e:#}"),
            })?;
        for line in result.stdout.lines() {
            self.log.debug(&format!("  | {line}"));
        }
        for line in result.stderr.lines() {
            self.log.debug(&format!("  ! {line}"));
        }
        Ok(result)
    }
}
