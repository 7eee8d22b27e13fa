//! Command-line interface definition.
use std::path::{Path, PathBuf};

use clap::Parser;
use clap_complete::Shell;

use crate::config::engine::{CyclePolicy, FailurePolicy, Flags};

/// Link dotfiles and provision an environment from a task document.
#[derive(Parser, Debug)]
#[command(
    name = "homemaker",
    about = "Task-driven dotfiles linker and environment provisioning engine",
    version = option_env!("HOMEMAKER_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Optional task document followed by the source directory
    #[arg(
        value_name = "[CONFIG] SRC",
        num_args = 1..=2,
        required_unless_present = "completions"
    )]
    pub paths: Vec<PathBuf>,

    /// Root task to run
    #[arg(short, long, default_value = "default")]
    pub task: String,

    /// Destination root (defaults to the home directory)
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Active variant
    #[arg(long)]
    pub variant: Option<String>,

    /// Replace (or, with --unlink, remove) entries that are in the way
    #[arg(long)]
    pub clobber: bool,

    /// Do not create missing parent directories
    #[arg(long = "no-force", action = clap::ArgAction::SetFalse)]
    pub force: bool,

    /// Log every decision
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not run commands
    #[arg(long)]
    pub nocmds: bool,

    /// Do not create links
    #[arg(long)]
    pub nolinks: bool,

    /// Remove links instead of creating them (implies --nocmds)
    #[arg(long)]
    pub unlink: bool,

    /// Show what would change without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Reject relative paths that escape their root
    #[arg(long)]
    pub confine: bool,

    /// What to do when a task is reached again while still running
    #[arg(long, value_enum, default_value_t = CyclePolicy::Skip)]
    pub cycles: CyclePolicy,

    /// Record hard failures and continue with the remaining work
    #[arg(short, long)]
    pub keep_going: bool,

    /// Treat "destination already exists" as a hard failure
    #[arg(long)]
    pub strict: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    /// The source directory (last positional argument).
    #[must_use]
    pub fn src(&self) -> Option<&Path> {
        self.paths.last().map(PathBuf::as_path)
    }

    /// The explicit task document, when two positionals were given.
    #[must_use]
    pub fn config(&self) -> Option<&Path> {
        match self.paths.as_slice() {
            [config, _] => Some(config.as_path()),
            _ => None,
        }
    }

    /// Behaviour switches selected on the command line.
    #[must_use]
    pub const fn flags(&self) -> Flags {
        Flags {
            clobber: self.clobber,
            force_create_parents: self.force,
            verbose: self.verbose,
            skip_commands: self.nocmds,
            skip_links: self.nolinks,
            unlink: self.unlink,
            dry_run: self.dry_run,
            confine_paths: self.confine,
            strict: self.strict,
        }
    }

    /// Failure policy selected on the command line.
    #[must_use]
    pub const fn failure_policy(&self) -> FailurePolicy {
        if self.keep_going {
            FailurePolicy::KeepGoing
        } else {
            FailurePolicy::Abort
        }
    }
}
