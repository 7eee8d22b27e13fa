//! The apply command: run the root task and report.
use std::sync::Arc;

use anyhow::Result;

use crate::cli::Cli;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger};
use crate::tasks::{Context, RunReport, TaskExecutor};

use super::CommandSetup;

/// Run the apply command with the system shell.
///
/// # Errors
///
/// Returns an error if setup fails, a fatal task error occurs, or failures
/// were collected under keep-going.
pub fn run(cli: &Cli, log: &Arc<Logger>) -> Result<()> {
    let version = option_env!("HOMEMAKER_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    log.info(&format!("homemaker {version}"));

    let result = execute(cli, Arc::clone(log) as Arc<dyn Log>, Arc::new(SystemExecutor));
    log.print_summary();

    let report = result?;
    let count = report.failures.len();
    if count > 0 {
        anyhow::bail!("{count} failure(s) during run");
    }
    Ok(())
}

/// Set up and execute one run with the given logger and executor.
///
/// # Errors
///
/// Returns an error if setup fails or a fatal task error occurs. Failures
/// collected under keep-going are returned in the report.
pub fn execute(cli: &Cli, log: Arc<dyn Log>, executor: Arc<dyn Executor>) -> Result<RunReport> {
    let setup = CommandSetup::init(cli, log.as_ref())?;
    let root = setup.config.root_task.clone();
    let dry_run = setup.config.flags.dry_run;
    let verb = if setup.config.flags.unlink {
        "Unlinking"
    } else {
        "Applying"
    };

    match setup.config.variant() {
        Some(variant) => log.stage(&format!("{verb} task '{root}' (variant '{variant}')")),
        None => log.stage(&format!("{verb} task '{root}'")),
    }

    let ctx = Context::new(setup.config, setup.graph, Arc::clone(&log), executor);
    let report = TaskExecutor::new(&ctx).run(&root)?;

    log.info(&format!("links: {}", report.links.summary(dry_run)));
    log.info(&format!(
        "commands: {} run, {} skipped",
        report.commands_run, report.commands_skipped
    ));
    Ok(report)
}
