//! Process execution: the [`Executor`] seam and the shell-backed implementation.
use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use anyhow::{Context as _, Result};

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code; `None` if the process was terminated by a signal.
    pub code: Option<i32>,
}

impl ExecResult {
    /// A successful result with the given stdout (convenient for tests and
    /// dry runs).
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
            code: Some(0),
        }
    }

    /// A failed result with the given exit code.
    #[must_use]
    pub const fn failed(code: i32) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            success: false,
            code: Some(code),
        }
    }
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Environment variables handed to a spawned command on top of the inherited
/// process environment.
///
/// Built once per run by the command layer and extended per task; the
/// process-wide environment is never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandEnv {
    vars: BTreeMap<String, String>,
}

impl CommandEnv {
    /// Create an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Add `pairs` in order, expanding `$VAR` references in each value
    /// against the variables already in the map, then the process
    /// environment. Unknown variables are left as written.
    pub fn extend_expanded<'p>(&mut self, pairs: impl IntoIterator<Item = &'p (String, String)>) {
        for (key, value) in pairs {
            let expanded = shellexpand::env_with_context_no_errors(value, |name| {
                self.get(name)
                    .map(ToString::to_string)
                    .or_else(|| std::env::var(name).ok())
            })
            .into_owned();
            self.set(key.as_str(), expanded);
        }
    }

    /// Look up a variable defined in this map (not the process environment).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Iterate over all variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of variables in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Abstraction over process execution so the engine can be tested without
/// spawning real processes.
#[cfg_attr(test, mockall::automock)]
pub trait Executor {
    /// Run `command` through the platform shell in `dir` with `env` added to
    /// the inherited environment.
    ///
    /// Standard input is inherited so commands may prompt. Standard output and
    /// error are captured and only available once the command exits.
    ///
    /// Non-zero exit is **not** an error here; inspect
    /// [`ExecResult::success`].
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be spawned.
    fn run_shell(&self, command: &str, dir: &Path, env: &CommandEnv) -> Result<ExecResult>;
}

/// Production [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_shell(&self, command: &str, dir: &Path, env: &CommandEnv) -> Result<ExecResult> {
        let mut cmd = shell_command(command);
        cmd.current_dir(dir).stdin(Stdio::inherit());
        for (k, v) in env.iter() {
            cmd.env(k, v);
        }
        let output = cmd
            .output()
            .with_context(|| format!("failed to execute: {command}"))?;
        Ok(ExecResult::from(output))
    }
}

/// Build the platform shell invocation for `command`.
fn shell_command(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}
