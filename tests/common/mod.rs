// Shared helpers for integration tests.
//
// Provides temporary source and destination trees and a fluent builder so
// each integration test can set up an isolated run without repeating
// filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use homemaker::cli::Cli;
use homemaker::commands::apply;
use homemaker::exec::SystemExecutor;
use homemaker::logging::{Log, Logger};
use homemaker::tasks::RunReport;

/// Isolated source and destination trees backed by a [`tempfile::TempDir`].
pub struct IntegrationTestContext {
    /// Temporary directory holding both trees.
    pub root: tempfile::TempDir,
    /// Source tree (link sources, task document).
    pub src: PathBuf,
    /// Destination tree (stands in for the home directory).
    pub dest: PathBuf,
}

impl IntegrationTestContext {
    /// Create empty source and destination trees.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let src = root.path().join("src");
        let dest = root.path().join("home");
        std::fs::create_dir_all(&src).expect("create src dir");
        std::fs::create_dir_all(&dest).expect("create dest dir");
        Self { root, src, dest }
    }

    /// Path of `rel` inside the destination tree.
    pub fn dest_path(&self, rel: &str) -> PathBuf {
        self.dest.join(rel)
    }

    /// Whether `rel` in the destination tree is a symlink.
    pub fn is_link(&self, rel: &str) -> bool {
        self.dest_path(rel)
            .symlink_metadata()
            .is_ok_and(|m| m.file_type().is_symlink())
    }

    /// Whether anything (including a dangling link) exists at `rel`.
    pub fn exists(&self, rel: &str) -> bool {
        self.dest_path(rel).symlink_metadata().is_ok()
    }

    /// Run the engine with `args` followed by `--dest <dest> <src>`.
    pub fn run(&self, args: &[&str]) -> (anyhow::Result<RunReport>, Arc<Logger>) {
        self.run_with_positionals(args, &[path_str(&self.src)])
    }

    /// Run the engine with an explicit task document path before `<src>`.
    pub fn run_with_config(
        &self,
        config: &Path,
        args: &[&str],
    ) -> (anyhow::Result<RunReport>, Arc<Logger>) {
        self.run_with_positionals(args, &[path_str(config), path_str(&self.src)])
    }

    fn run_with_positionals(
        &self,
        args: &[&str],
        positionals: &[&str],
    ) -> (anyhow::Result<RunReport>, Arc<Logger>) {
        let argv = std::iter::once("homemaker")
            .chain(args.iter().copied())
            .chain(["--dest", path_str(&self.dest)])
            .chain(positionals.iter().copied());
        let cli = Cli::parse_from(argv);
        let log = Arc::new(Logger::new("test").with_log_file(None));
        let result = apply::execute(
            &cli,
            Arc::clone(&log) as Arc<dyn Log>,
            Arc::new(SystemExecutor),
        );
        (result, log)
    }

    /// Recorded task results as `name: status (message)` lines.
    pub fn render_tasks(log: &Logger) -> String {
        log.task_entries()
            .iter()
            .map(|t| match &t.message {
                Some(msg) => format!("{}: {:?} ({msg})", t.name, t.status),
                None => format!("{}: {:?}", t.name, t.status),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building with empty trees.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Write `content` to `rel` in the source tree, creating parents.
    #[must_use]
    pub fn with_source_file(self, rel: &str, content: &str) -> Self {
        let path = self.ctx.src.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create source parent");
        }
        std::fs::write(path, content).expect("write source file");
        self
    }

    /// Write `content` to `rel` in the destination tree, creating parents.
    #[must_use]
    pub fn with_dest_file(self, rel: &str, content: &str) -> Self {
        let path = self.ctx.dest.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dest parent");
        }
        std::fs::write(path, content).expect("write dest file");
        self
    }

    /// Write the task document `tasks.toml` into the source tree.
    #[must_use]
    pub fn with_tasks(self, document: &str) -> Self {
        self.with_source_file("tasks.toml", document)
    }

    /// Finalise the context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}
