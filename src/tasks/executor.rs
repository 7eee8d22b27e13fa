//! Depth-first task execution with at-most-once semantics.
//!
//! Each task name moves through three states: unvisited (absent from the
//! map), in progress, and done. A done task is never executed again in the
//! same run; reaching an in-progress task means the graph has a cycle and
//! the configured [`CyclePolicy`] decides what happens.
use std::collections::HashMap;
use std::path::Path;

use crate::config::engine::{CyclePolicy, FailurePolicy};
use crate::error::TaskError;
use crate::exec::CommandEnv;
use crate::logging::TaskStatus;
use crate::resources::command::CommandRunner;
use crate::resources::link::LinkResource;
use crate::resources::{LinkOutcome, path};

use super::graph::{LinkSpec, ResolvedTask};
use super::{Context, LinkStats, RunReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Per-run visitation record plus the current traversal stack.
#[derive(Debug, Default)]
pub struct ExecutionState {
    visits: HashMap<String, Visit>,
    stack: Vec<String>,
}

impl ExecutionState {
    /// Whether `name` has finished executing.
    #[must_use]
    pub fn is_done(&self, name: &str) -> bool {
        self.visits.get(name) == Some(&Visit::Done)
    }

    /// Whether `name` is on the current traversal stack.
    #[must_use]
    pub fn is_in_progress(&self, name: &str) -> bool {
        self.visits.get(name) == Some(&Visit::InProgress)
    }

    /// Names currently being executed, outermost first.
    #[must_use]
    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    fn enter(&mut self, name: &str) {
        self.visits.insert(name.to_string(), Visit::InProgress);
        self.stack.push(name.to_string());
    }

    fn finish(&mut self, name: &str) {
        self.visits.insert(name.to_string(), Visit::Done);
        if self.stack.last().is_some_and(|top| top == name) {
            self.stack.pop();
        }
    }

    /// `a -> b -> a` from the first occurrence of `name` on the stack.
    fn cycle_chain(&self, name: &str) -> String {
        let start = self.stack.iter().position(|n| n == name).unwrap_or(0);
        let mut chain: Vec<&str> = self
            .stack
            .iter()
            .skip(start)
            .map(String::as_str)
            .collect();
        chain.push(name);
        chain.join(" -> ")
    }
}

/// Walks the task graph from a root task, applying links and running
/// commands in declaration order.
#[derive(Debug)]
pub struct TaskExecutor<'a> {
    ctx: &'a Context,
    state: ExecutionState,
    report: RunReport,
}

impl<'a> TaskExecutor<'a> {
    /// Create an executor with a fresh state.
    #[must_use]
    pub fn new(ctx: &'a Context) -> Self {
        Self {
            ctx,
            state: ExecutionState::default(),
            report: RunReport::default(),
        }
    }

    /// Execute `root` and everything it depends on, returning the report.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`TaskError`]. Under
    /// [`FailurePolicy::KeepGoing`] link and command failures are collected in
    /// [`RunReport::failures`] instead.
    pub fn run(mut self, root: &str) -> Result<RunReport, TaskError> {
        self.execute(root)?;
        Ok(self.report)
    }

    /// Visitation state so far.
    #[must_use]
    pub const fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Report so far.
    #[must_use]
    pub const fn report(&self) -> &RunReport {
        &self.report
    }

    /// Execute `name` unless it is already done.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::UnknownTask`] for an undeclared task,
    /// [`TaskError::CyclicDependency`] when a cycle is reached under
    /// [`CyclePolicy::Error`], and link or command failures under
    /// [`FailurePolicy::Abort`].
    pub fn execute(&mut self, name: &str) -> Result<(), TaskError> {
        if self.state.is_done(name) {
            self.ctx.log.debug(&format!("task '{name}' already done"));
            return Ok(());
        }
        if self.state.is_in_progress(name) {
            let chain = self.state.cycle_chain(name);
            return match self.ctx.config.cycle_policy {
                CyclePolicy::Skip => {
                    self.ctx
                        .log
                        .debug(&format!("cycle {chain}: treating '{name}' as satisfied"));
                    Ok(())
                }
                CyclePolicy::Error => Err(TaskError::CyclicDependency(chain)),
            };
        }

        let ctx = self.ctx;
        self.state.enter(name);
        let result = ctx
            .graph
            .resolve_task(name, ctx.config.variant())
            .and_then(|task| self.execute_resolved(&task));

        match result {
            Ok((status, message)) => {
                self.state.finish(name);
                ctx.log.record_task(name, status, message.as_deref());
                self.report.statuses.push((name.to_string(), status));
                Ok(())
            }
            Err(e) => {
                self.state.finish(name);
                ctx.log
                    .record_task(name, TaskStatus::Failed, Some(&e.to_string()));
                self.report
                    .statuses
                    .push((name.to_string(), TaskStatus::Failed));
                Err(e)
            }
        }
    }

    fn execute_resolved(
        &mut self,
        task: &ResolvedTask<'_>,
    ) -> Result<(TaskStatus, Option<String>), TaskError> {
        let ctx = self.ctx;
        match task.variant {
            Some(variant) => ctx
                .log
                .debug(&format!("task '{}' (variant '{variant}')", task.name)),
            None => ctx.log.debug(&format!("task '{}'", task.name)),
        }

        let mut env = ctx.env.clone();
        env.extend_expanded(task.envs);

        if !self.conditions_pass(task, &env)? {
            return Ok((TaskStatus::NotApplicable, Some("conditions not met".to_string())));
        }

        for sub in task.subtasks {
            self.execute(sub)?;
        }

        let mut stats = LinkStats::new();
        let mut hard = 0u32;
        for link in task.links {
            match self.apply_link(link, &env) {
                LinkOutcome::Failed(e) if e.is_soft() && !ctx.config.flags.strict => {
                    stats.conflicts += 1;
                    ctx.log.warn(&format!("task '{}': {e}", task.name));
                }
                LinkOutcome::Failed(e) => {
                    stats.failed += 1;
                    hard += 1;
                    self.hard_failure(TaskError::LinkFailed {
                        task: task.name.to_string(),
                        source: e,
                    })?;
                }
                outcome => stats.record(&outcome),
            }
        }
        self.report.links.merge(&stats);

        hard += self.run_commands(task, &env)?;

        let status = if hard > 0 {
            TaskStatus::Failed
        } else if stats.conflicts > 0 {
            TaskStatus::Conflict
        } else if ctx.dry_run() {
            TaskStatus::DryRun
        } else {
            TaskStatus::Ok
        };
        let message = (stats.total() > 0).then(|| stats.summary(ctx.dry_run()));
        Ok((status, message))
    }

    /// Every `accepts` command must succeed and every `rejects` command
    /// must fail.
    fn conditions_pass(&self, task: &ResolvedTask<'_>, env: &CommandEnv) -> Result<bool, TaskError> {
        if task.accepts.is_empty() && task.rejects.is_empty() {
            return Ok(true);
        }
        let runner = self.runner();
        let failed = |source| TaskError::CommandFailed {
            task: task.name.to_string(),
            source,
        };

        for condition in task.accepts {
            if !runner.check(condition, env).map_err(failed)? {
                self.ctx.log.debug(&format!(
                    "task '{}' not applicable: '{condition}' failed",
                    task.name
                ));
                return Ok(false);
            }
        }
        for condition in task.rejects {
            if runner.check(condition, env).map_err(failed)? {
                self.ctx.log.debug(&format!(
                    "task '{}' not applicable: '{condition}' succeeded",
                    task.name
                ));
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn apply_link(&self, link: &LinkSpec, env: &CommandEnv) -> LinkOutcome {
        let config = &self.ctx.config;
        let confine = config.flags.confine_paths;
        let resolve = |root: &Path, raw: &str| {
            if link.literal {
                path::resolve_literal(root, raw, confine)
            } else {
                path::resolve(root, raw, env, confine)
            }
        };
        let resolved = resolve(config.src_dir(), &link.source).and_then(|source| {
            resolve(config.dest_dir(), &link.target)
                .map(|target| LinkResource::new(source, target, link.mode))
        });
        let resource = match resolved {
            Ok(resource) => resource,
            Err(e) => return LinkOutcome::Failed(e),
        };

        let outcome = resource.apply(&config.flags);
        if outcome.is_change() && config.flags.dry_run {
            self.ctx.log.dry_run(&format!(
                "{} {}",
                outcome.label(true),
                resource.description()
            ));
        } else if outcome.error().is_none() {
            self.ctx.log.debug(&format!(
                "{}: {}",
                outcome.label(false),
                resource.description()
            ));
        }
        outcome
    }

    /// Run the task's commands; returns the number of failures recorded
    /// under keep-going.
    fn run_commands(&mut self, task: &ResolvedTask<'_>, env: &CommandEnv) -> Result<u32, TaskError> {
        let ctx = self.ctx;
        if ctx.config.flags.effective_skip_commands() {
            for command in task.commands {
                ctx.log.debug(&format!("skipped command: {command}"));
                self.report.commands_skipped += 1;
            }
            return Ok(0);
        }

        let mut failures = 0u32;
        for command in task.commands {
            if ctx.dry_run() {
                ctx.log.dry_run(&format!("would run: {command}"));
                self.report.commands_skipped += 1;
                continue;
            }
            match self.runner().run(command, env) {
                Ok(_) => self.report.commands_run += 1,
                Err(source) => {
                    failures += 1;
                    self.report.commands_skipped += 1;
                    self.hard_failure(TaskError::CommandFailed {
                        task: task.name.to_string(),
                        source,
                    })?;
                }
            }
        }
        Ok(failures)
    }

    fn runner(&self) -> CommandRunner<'a> {
        let ctx = self.ctx;
        CommandRunner::new(ctx.executor.as_ref(), ctx.log.as_ref(), ctx.src_dir())
    }

    fn hard_failure(&mut self, err: TaskError) -> Result<(), TaskError> {
        match self.ctx.config.failure_policy {
            FailurePolicy::Abort => Err(err),
            FailurePolicy::KeepGoing => {
                self.ctx.log.error(&err.to_string());
                self.report.failures.push(err);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Arc;

    use mockall::predicate::{always, eq};

    use crate::config::engine::{EngineConfig, Flags};
    use crate::error::{CommandError, LinkError};
    use crate::exec::{ExecResult, MockExecutor};
    use crate::tasks::graph::{Task, TaskGraph, Variant};
    use crate::tasks::test_helpers::RecordingLog;

    struct Fixture {
        _dir: tempfile::TempDir,
        src: PathBuf,
        dest: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let src = dir.path().join("src");
            let dest = dir.path().join("dest");
            std::fs::create_dir_all(&src).unwrap();
            std::fs::create_dir_all(&dest).unwrap();
            for name in ["bashrc", "bashrc.work", "vimrc", "gitconfig"] {
                std::fs::write(src.join(name), name).unwrap();
            }
            Self {
                _dir: dir,
                src,
                dest,
            }
        }

        fn config(&self) -> EngineConfig {
            EngineConfig::new(&self.src, &self.dest)
        }

        fn context(
            &self,
            config: EngineConfig,
            graph: TaskGraph,
            executor: MockExecutor,
        ) -> (Context, Arc<RecordingLog>) {
            let log = Arc::new(RecordingLog::new());
            let ctx = Context::new(config, graph, log.clone(), Arc::new(executor));
            (ctx, log)
        }

        fn is_link(&self, rel: &str) -> bool {
            self.dest
                .join(rel)
                .symlink_metadata()
                .is_ok_and(|m| m.file_type().is_symlink())
        }
    }

    fn subtasks(names: &[&str]) -> Task {
        Task {
            subtasks: names.iter().map(ToString::to_string).collect(),
            ..Task::default()
        }
    }

    fn commands(cmds: &[&str]) -> Task {
        Task {
            commands: cmds.iter().map(ToString::to_string).collect(),
            ..Task::default()
        }
    }

    fn links(pairs: &[(&str, &str)]) -> Task {
        Task {
            links: pairs.iter().map(|(s, t)| LinkSpec::new(*s, *t)).collect(),
            ..Task::default()
        }
    }

    fn no_commands() -> MockExecutor {
        let mut executor = MockExecutor::new();
        executor.expect_run_shell().never();
        executor
    }

    // -----------------------------------------------------------------------
    // Concrete scenario
    // -----------------------------------------------------------------------

    #[cfg(unix)]
    #[test]
    fn links_then_runs_command_with_hm_env() {
        let fx = Fixture::new();
        let graph = TaskGraph::new().with_task(
            "default",
            Task {
                links: vec![LinkSpec::new("bashrc", ".bashrc")],
                commands: vec!["echo hi".to_string()],
                ..Task::default()
            },
        );

        let mut executor = MockExecutor::new();
        let src = fx.src.clone();
        executor
            .expect_run_shell()
            .withf(move |cmd, dir, env| {
                cmd == "echo hi" && dir == src && env.get("HM_TASK") == Some("default")
            })
            .times(1)
            .returning(|_, _, _| Ok(ExecResult::ok("hi\n")));

        let (ctx, log) = fx.context(fx.config(), graph, executor);
        let report = TaskExecutor::new(&ctx).run("default").unwrap();

        assert_eq!(
            std::fs::read_link(fx.dest.join(".bashrc")).unwrap(),
            fx.src.join("bashrc")
        );
        assert_eq!(report.links.created, 1);
        assert_eq!(report.commands_run, 1);
        assert_eq!(report.status_of("default"), Some(TaskStatus::Ok));
        assert_eq!(
            log.tasks(),
            vec![(
                "default".to_string(),
                TaskStatus::Ok,
                Some("1 created".to_string())
            )]
        );
    }

    #[cfg(unix)]
    #[test]
    fn second_run_only_skips() {
        let fx = Fixture::new();
        let graph = TaskGraph::new().with_task("default", links(&[("bashrc", ".bashrc")]));

        let (ctx, _log) = fx.context(fx.config(), graph.clone(), no_commands());
        let first = TaskExecutor::new(&ctx).run("default").unwrap();
        assert_eq!(first.links.created, 1);

        let (ctx, _log) = fx.context(fx.config(), graph, no_commands());
        let second = TaskExecutor::new(&ctx).run("default").unwrap();
        assert_eq!(second.links.skipped, 1);
        assert_eq!(second.links.total(), 1);
    }

    // -----------------------------------------------------------------------
    // Ordering and at-most-once
    // -----------------------------------------------------------------------

    #[test]
    fn shared_subtask_runs_once() {
        let fx = Fixture::new();
        let graph = TaskGraph::new()
            .with_task("default", subtasks(&["a", "b"]))
            .with_task("a", subtasks(&["common"]))
            .with_task("b", subtasks(&["common"]))
            .with_task("common", commands(&["echo common"]));

        let mut executor = MockExecutor::new();
        executor
            .expect_run_shell()
            .with(eq("echo common"), always(), always())
            .times(1)
            .returning(|_, _, _| Ok(ExecResult::ok("")));

        let (ctx, _log) = fx.context(fx.config(), graph, executor);
        let report = TaskExecutor::new(&ctx).run("default").unwrap();

        let order: Vec<&str> = report.statuses.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(order, vec!["common", "a", "b", "default"]);
    }

    #[test]
    fn subtasks_run_before_own_commands() {
        let fx = Fixture::new();
        let mut parent = commands(&["echo parent"]);
        parent.subtasks = vec!["child".to_string()];
        let graph = TaskGraph::new()
            .with_task("default", parent)
            .with_task("child", commands(&["echo child"]));

        let mut seq = mockall::Sequence::new();
        let mut executor = MockExecutor::new();
        executor
            .expect_run_shell()
            .with(eq("echo child"), always(), always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(ExecResult::ok("")));
        executor
            .expect_run_shell()
            .with(eq("echo parent"), always(), always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(ExecResult::ok("")));

        let (ctx, _log) = fx.context(fx.config(), graph, executor);
        TaskExecutor::new(&ctx).run("default").unwrap();
    }

    #[test]
    fn unknown_root_task_fails() {
        let fx = Fixture::new();
        let (ctx, _log) = fx.context(fx.config(), TaskGraph::new(), no_commands());
        let err = TaskExecutor::new(&ctx).run("nope").unwrap_err();
        assert!(matches!(err, TaskError::UnknownTask(ref n) if n == "nope"));
    }

    #[test]
    fn unknown_subtask_fails_before_parent_links() {
        let fx = Fixture::new();
        let mut parent = links(&[("bashrc", ".bashrc")]);
        parent.subtasks = vec!["ghost".to_string()];
        let graph = TaskGraph::new().with_task("default", parent);

        let (ctx, log) = fx.context(fx.config(), graph, no_commands());
        let err = TaskExecutor::new(&ctx).run("default").unwrap_err();

        assert!(matches!(err, TaskError::UnknownTask(ref n) if n == "ghost"));
        assert!(!fx.is_link(".bashrc"));
        assert_eq!(log.tasks()[0].1, TaskStatus::Failed);
    }

    // -----------------------------------------------------------------------
    // Cycles
    // -----------------------------------------------------------------------

    fn cyclic_graph() -> TaskGraph {
        let mut a = subtasks(&["b"]);
        a.commands = vec!["echo a".to_string()];
        let mut b = subtasks(&["a"]);
        b.commands = vec!["echo b".to_string()];
        TaskGraph::new().with_task("a", a).with_task("b", b)
    }

    #[test]
    fn cycle_skip_runs_each_task_once() {
        let fx = Fixture::new();
        let mut executor = MockExecutor::new();
        executor
            .expect_run_shell()
            .with(eq("echo a"), always(), always())
            .times(1)
            .returning(|_, _, _| Ok(ExecResult::ok("")));
        executor
            .expect_run_shell()
            .with(eq("echo b"), always(), always())
            .times(1)
            .returning(|_, _, _| Ok(ExecResult::ok("")));

        let (ctx, log) = fx.context(fx.config(), cyclic_graph(), executor);
        let report = TaskExecutor::new(&ctx).run("a").unwrap();

        assert!(report.is_success());
        assert!(log.contains("cycle a -> b -> a"));
    }

    #[test]
    fn cycle_error_reports_chain() {
        let fx = Fixture::new();
        let mut config = fx.config();
        config.cycle_policy = CyclePolicy::Error;

        let (ctx, _log) = fx.context(config, cyclic_graph(), no_commands());
        let err = TaskExecutor::new(&ctx).run("a").unwrap_err();

        assert!(matches!(err, TaskError::CyclicDependency(ref c) if c == "a -> b -> a"));
    }

    #[test]
    fn self_cycle_error() {
        let fx = Fixture::new();
        let mut config = fx.config();
        config.cycle_policy = CyclePolicy::Error;
        let graph = TaskGraph::new().with_task("a", subtasks(&["a"]));

        let (ctx, _log) = fx.context(config, graph, no_commands());
        let err = TaskExecutor::new(&ctx).run("a").unwrap_err();

        assert_eq!(err.to_string(), "task dependency cycle detected: a -> a");
    }

    // -----------------------------------------------------------------------
    // Variants
    // -----------------------------------------------------------------------

    #[cfg(unix)]
    #[test]
    fn active_variant_replaces_links() {
        let fx = Fixture::new();
        let mut task = links(&[("bashrc", ".bashrc")]);
        task.variants = BTreeMap::from([(
            "work".to_string(),
            Variant {
                links: Some(vec![LinkSpec::new("bashrc.work", ".bashrc")]),
                ..Variant::default()
            },
        )]);
        let graph = TaskGraph::new().with_task("default", task);
        let mut config = fx.config();
        config.variant = Some("work".to_string());

        let (ctx, log) = fx.context(config, graph, no_commands());
        TaskExecutor::new(&ctx).run("default").unwrap();

        assert_eq!(
            std::fs::read_link(fx.dest.join(".bashrc")).unwrap(),
            fx.src.join("bashrc.work")
        );
        assert!(log.contains("variant 'work'"));
    }

    // -----------------------------------------------------------------------
    // Failures
    // -----------------------------------------------------------------------

    #[test]
    fn existing_file_is_soft_and_task_continues() {
        let fx = Fixture::new();
        std::fs::write(fx.dest.join(".bashrc"), "mine").unwrap();
        let graph = TaskGraph::new().with_task(
            "default",
            links(&[("bashrc", ".bashrc"), ("vimrc", ".vimrc")]),
        );

        let (ctx, log) = fx.context(fx.config(), graph, no_commands());
        let report = TaskExecutor::new(&ctx).run("default").unwrap();

        assert_eq!(std::fs::read_to_string(fx.dest.join(".bashrc")).unwrap(), "mine");
        assert!(fx.is_link(".vimrc"));
        assert_eq!(report.links.conflicts, 1);
        assert_eq!(report.status_of("default"), Some(TaskStatus::Conflict));
        assert!(report.is_success());
        assert!(log.contains("warn: task 'default': destination already exists"));
    }

    #[test]
    fn strict_promotes_existing_file_to_hard_failure() {
        let fx = Fixture::new();
        std::fs::write(fx.dest.join(".bashrc"), "mine").unwrap();
        let graph = TaskGraph::new().with_task("default", links(&[("bashrc", ".bashrc")]));
        let mut config = fx.config();
        config.flags.strict = true;

        let (ctx, _log) = fx.context(config, graph, no_commands());
        let err = TaskExecutor::new(&ctx).run("default").unwrap_err();

        assert!(matches!(
            err,
            TaskError::LinkFailed {
                source: LinkError::AlreadyExists(_),
                ..
            }
        ));
    }

    #[test]
    fn failed_command_aborts_run() {
        let fx = Fixture::new();
        let mut parent = subtasks(&["broken"]);
        parent.commands = vec!["echo after".to_string()];
        let graph = TaskGraph::new()
            .with_task("default", parent)
            .with_task("broken", commands(&["false"]));

        let mut executor = MockExecutor::new();
        executor
            .expect_run_shell()
            .with(eq("false"), always(), always())
            .times(1)
            .returning(|_, _, _| Ok(ExecResult::failed(1)));
        executor
            .expect_run_shell()
            .with(eq("echo after"), always(), always())
            .never();

        let (ctx, _log) = fx.context(fx.config(), graph, executor);
        let err = TaskExecutor::new(&ctx).run("default").unwrap_err();

        assert!(matches!(
            err,
            TaskError::CommandFailed {
                source: CommandError::Failed { code: 1, .. },
                ..
            }
        ));
    }

    #[test]
    fn keep_going_collects_failures_and_continues() {
        let fx = Fixture::new();
        let graph = TaskGraph::new().with_task(
            "default",
            Task {
                links: vec![
                    LinkSpec::new("missing", ".missing"),
                    LinkSpec::new("vimrc", ".vimrc"),
                ],
                commands: vec!["false".to_string(), "echo ok".to_string()],
                ..Task::default()
            },
        );
        let mut config = fx.config();
        config.failure_policy = FailurePolicy::KeepGoing;

        let mut executor = MockExecutor::new();
        executor
            .expect_run_shell()
            .with(eq("false"), always(), always())
            .returning(|_, _, _| Ok(ExecResult::failed(1)));
        executor
            .expect_run_shell()
            .with(eq("echo ok"), always(), always())
            .times(1)
            .returning(|_, _, _| Ok(ExecResult::ok("")));

        let (ctx, log) = fx.context(config, graph, executor);
        let report = TaskExecutor::new(&ctx).run("default").unwrap();

        assert!(fx.is_link(".vimrc"));
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.commands_run, 1);
        assert_eq!(report.status_of("default"), Some(TaskStatus::Failed));
        assert!(log.contains("error: task 'default': source does not exist"));
    }

    #[test]
    fn missing_parent_without_force_is_fatal() {
        let fx = Fixture::new();
        let graph = TaskGraph::new().with_task("default", links(&[("vimrc", ".vim/vimrc")]));
        let mut config = fx.config();
        config.flags.force_create_parents = false;

        let (ctx, _log) = fx.context(config, graph, no_commands());
        let err = TaskExecutor::new(&ctx).run("default").unwrap_err();

        assert!(matches!(
            err,
            TaskError::LinkFailed {
                source: LinkError::MissingParent(_),
                ..
            }
        ));
    }

    #[test]
    fn confined_escape_is_invalid_path() {
        let fx = Fixture::new();
        let graph = TaskGraph::new().with_task("default", links(&[("vimrc", "../outside")]));
        let mut config = fx.config();
        config.flags.confine_paths = true;

        let (ctx, _log) = fx.context(config, graph, no_commands());
        let err = TaskExecutor::new(&ctx).run("default").unwrap_err();

        assert!(matches!(
            err,
            TaskError::LinkFailed {
                source: LinkError::InvalidPath { .. },
                ..
            }
        ));
    }

    // -----------------------------------------------------------------------
    // Flags
    // -----------------------------------------------------------------------

    #[test]
    fn nocmds_never_invokes_executor() {
        let fx = Fixture::new();
        let graph = TaskGraph::new().with_task("default", commands(&["echo hi"]));
        let mut config = fx.config();
        config.flags.skip_commands = true;

        let (ctx, _log) = fx.context(config, graph, no_commands());
        let report = TaskExecutor::new(&ctx).run("default").unwrap();
        assert_eq!(report.commands_skipped, 1);
    }

    #[cfg(unix)]
    #[test]
    fn unlink_removes_links_and_skips_commands() {
        let fx = Fixture::new();
        let graph = TaskGraph::new().with_task(
            "default",
            Task {
                links: vec![LinkSpec::new("bashrc", ".bashrc")],
                commands: vec!["echo hi".to_string()],
                ..Task::default()
            },
        );
        std::os::unix::fs::symlink(fx.src.join("bashrc"), fx.dest.join(".bashrc")).unwrap();
        std::fs::write(fx.dest.join(".vimrc"), "mine").unwrap();

        let mut config = fx.config();
        config.flags = Flags {
            unlink: true,
            ..Flags::default()
        };

        let (ctx, _log) = fx.context(config, graph, no_commands());
        let report = TaskExecutor::new(&ctx).run("default").unwrap();

        assert_eq!(report.links.removed, 1);
        assert!(fx.dest.join(".bashrc").symlink_metadata().is_err());
        assert!(fx.dest.join(".vimrc").exists());
    }

    #[test]
    fn dry_run_changes_nothing() {
        let fx = Fixture::new();
        let graph = TaskGraph::new().with_task(
            "default",
            Task {
                links: vec![LinkSpec::new("bashrc", ".config/bash/bashrc")],
                commands: vec!["echo hi".to_string()],
                ..Task::default()
            },
        );
        let mut config = fx.config();
        config.flags.dry_run = true;

        let (ctx, log) = fx.context(config, graph, no_commands());
        let report = TaskExecutor::new(&ctx).run("default").unwrap();

        assert!(!fx.dest.join(".config").exists());
        assert_eq!(report.status_of("default"), Some(TaskStatus::DryRun));
        assert!(log.contains("dry_run: would create"));
        assert!(log.contains("dry_run: would run: echo hi"));
    }

    // -----------------------------------------------------------------------
    // Conditions and envs
    // -----------------------------------------------------------------------

    #[test]
    fn rejected_task_is_not_applicable_and_skips_everything() {
        let fx = Fixture::new();
        let graph = TaskGraph::new()
            .with_task(
                "default",
                Task {
                    subtasks: vec!["child".to_string()],
                    links: vec![LinkSpec::new("bashrc", ".bashrc")],
                    commands: vec!["echo hi".to_string()],
                    accepts: vec!["command -v nothing".to_string()],
                    ..Task::default()
                },
            )
            .with_task("child", commands(&["echo child"]));

        let mut executor = MockExecutor::new();
        executor
            .expect_run_shell()
            .with(eq("command -v nothing"), always(), always())
            .times(1)
            .returning(|_, _, _| Ok(ExecResult::failed(1)));

        let (ctx, _log) = fx.context(fx.config(), graph, executor);
        let mut exec = TaskExecutor::new(&ctx);
        exec.execute("default").unwrap();

        assert!(exec.state().is_done("default"));
        assert!(!exec.state().is_done("child"));
        assert_eq!(
            exec.report().status_of("default"),
            Some(TaskStatus::NotApplicable)
        );
        assert!(!fx.is_link(".bashrc"));
    }

    #[test]
    fn reject_condition_that_fails_lets_task_run() {
        let fx = Fixture::new();
        let mut task = commands(&["echo hi"]);
        task.rejects = vec!["test -e /nope".to_string()];
        let graph = TaskGraph::new().with_task("default", task);

        let mut executor = MockExecutor::new();
        executor
            .expect_run_shell()
            .with(eq("test -e /nope"), always(), always())
            .returning(|_, _, _| Ok(ExecResult::failed(1)));
        executor
            .expect_run_shell()
            .with(eq("echo hi"), always(), always())
            .times(1)
            .returning(|_, _, _| Ok(ExecResult::ok("")));

        let (ctx, _log) = fx.context(fx.config(), graph, executor);
        let report = TaskExecutor::new(&ctx).run("default").unwrap();
        assert_eq!(report.status_of("default"), Some(TaskStatus::Ok));
    }

    #[test]
    fn task_envs_reach_only_that_tasks_commands() {
        let fx = Fixture::new();
        let mut parent = commands(&["echo parent"]);
        parent.subtasks = vec!["child".to_string()];
        parent.envs = vec![("EDITOR".to_string(), "vim".to_string())];
        let graph = TaskGraph::new()
            .with_task("default", parent)
            .with_task("child", commands(&["echo child"]));

        let mut executor = MockExecutor::new();
        executor
            .expect_run_shell()
            .withf(|cmd, _, env| cmd == "echo child" && env.get("EDITOR").is_none())
            .times(1)
            .returning(|_, _, _| Ok(ExecResult::ok("")));
        executor
            .expect_run_shell()
            .withf(|cmd, _, env| cmd == "echo parent" && env.get("EDITOR") == Some("vim"))
            .times(1)
            .returning(|_, _, _| Ok(ExecResult::ok("")));

        let (ctx, _log) = fx.context(fx.config(), graph, executor);
        TaskExecutor::new(&ctx).run("default").unwrap();
    }

    // -----------------------------------------------------------------------
    // ExecutionState
    // -----------------------------------------------------------------------

    #[test]
    fn state_transitions() {
        let mut state = ExecutionState::default();
        assert!(!state.is_done("a"));
        state.enter("a");
        assert!(state.is_in_progress("a"));
        assert_eq!(state.stack(), &["a".to_string()]);
        state.finish("a");
        assert!(state.is_done("a"));
        assert!(state.stack().is_empty());
    }

    #[test]
    fn cycle_chain_starts_at_reentered_task() {
        let mut state = ExecutionState::default();
        state.enter("root");
        state.enter("a");
        state.enter("b");
        assert_eq!(state.cycle_chain("a"), "a -> b -> a");
    }
}
