//! `homemaker` binary entry point.
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};

use homemaker::cli::Cli;
use homemaker::commands;
use homemaker::logging::{self, Logger};

const COMMAND: &str = "homemaker";

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Cli::command(), COMMAND, &mut std::io::stdout());
        return Ok(());
    }

    logging::init_subscriber(args.verbose, COMMAND);
    let log = Arc::new(Logger::new(COMMAND));

    ctrlc::set_handler(|| {
        tracing::error!("interrupted");
        std::process::exit(130);
    })
    .context("cannot install interrupt handler")?;

    commands::apply::run(&args, &log)
}
