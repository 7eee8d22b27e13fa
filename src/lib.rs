//! Task-driven dotfiles linker and environment provisioning engine.
//!
//! A task document names tasks; each task may depend on other tasks, link
//! files from a source tree into a destination tree, and run shell commands.
//! Running a root task executes its dependency graph depth-first, every task
//! at most once.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: load and validate the task document
//! - **[`resources`]**: idempotent link and command primitives
//! - **[`tasks`]**: the task graph and its executor
//! - **[`commands`]**: top-level command orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod resources;
pub mod tasks;
