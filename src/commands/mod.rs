//! Top-level command orchestration.
pub mod apply;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::Cli;
use crate::config::engine::EngineConfig;
use crate::config::{self, GraphSource, validation};
use crate::exec::CommandEnv;
use crate::logging::Log;
use crate::resources::path;
use crate::tasks::TaskGraph;

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates root resolution, task document loading and validation so the
/// command itself only has to run the executor.
#[derive(Debug)]
pub struct CommandSetup {
    /// Run-wide settings derived from the command line.
    pub config: EngineConfig,
    /// The loaded task graph.
    pub graph: TaskGraph,
}

impl CommandSetup {
    /// Resolve roots, load the task document and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if a root cannot be resolved, the source directory
    /// does not exist, or the task document cannot be loaded.
    pub fn init(cli: &Cli, log: &dyn Log) -> Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;

        let src_arg = cli.src().context("missing source directory")?;
        let src_dir = resolve_root(&cwd, src_arg)?;
        if !src_dir.is_dir() {
            anyhow::bail!("source directory does not exist: {}", src_dir.display());
        }

        let dest_dir = match &cli.dest {
            Some(dest) => resolve_root(&cwd, dest)?,
            None => path::home_dir().context("cannot determine home directory; use --dest")?,
        };
        let config_arg = cli.config().map(|p| resolve_root(&cwd, p)).transpose()?;

        log.stage("Loading tasks");
        let (graph, source) = config::load_graph(config_arg.as_deref(), &src_dir)?;
        match &source {
            GraphSource::File(p) => {
                log.info(&format!("loaded {} tasks from {}", graph.len(), p.display()));
            }
            GraphSource::Fallback => log.info(&format!(
                "no task document in {}; linking every entry",
                src_dir.display()
            )),
        }
        log.debug(&format!("source: {}", src_dir.display()));
        log.debug(&format!("destination: {}", dest_dir.display()));

        let warnings = validation::validate_all(&graph, &src_dir);
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!("  {warning}"));
            }
        }

        let mut engine = EngineConfig::new(src_dir, dest_dir);
        engine.config_path = source.path().map(Path::to_path_buf);
        engine.root_task.clone_from(&cli.task);
        engine.variant.clone_from(&cli.variant);
        engine.flags = cli.flags();
        engine.cycle_policy = cli.cycles;
        engine.failure_policy = cli.failure_policy();

        Ok(Self {
            config: engine,
            graph,
        })
    }
}

/// Make a command-line root absolute.
///
/// `~` and `$VAR` are expanded, relative paths are joined onto `cwd`, and
/// existing paths are canonicalized without the Windows `\\?\` prefix.
///
/// # Errors
///
/// Returns an error if the path is empty or references an undefined variable.
pub fn resolve_root(cwd: &Path, raw: &Path) -> Result<PathBuf> {
    let raw_str = raw.to_string_lossy();
    let resolved = path::resolve(cwd, &raw_str, &CommandEnv::new(), false)
        .with_context(|| format!("invalid root path: {}", raw.display()))?;
    Ok(dunce::canonicalize(&resolved).unwrap_or(resolved))
}
