//! Process plumbing for xtc-submit.
//!
//! This crate implements the execution layer: the `InvocationPlan` command
//! model with shell-quoted rendering, ruby install detection and gem install
//! command construction, the pluggable `CommandRunner` trait with system and
//! mock runners, and the envman export used to signal results to later steps.

pub mod command;
pub mod export;
pub mod ruby;
pub mod runner;

pub use command::InvocationPlan;
pub use export::{export_env, export_failure, RESULT_FAILED, RESULT_KEY};
pub use ruby::{gem_install, ruby_command, RubyInstallType};
pub use runner::{select_runner, CommandRunner, MockRunner, SystemRunner};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("runner '{0}' is not available")]
    RunnerUnavailable(String),
    #[error("cannot run an empty command")]
    EmptyCommand,
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' exited with {}", .status.map_or_else(|| "a signal".to_owned(), |c| format!("status {c}")))]
    CommandFailed { program: String, status: Option<i32> },
    #[error("failed to export {key}: {reason}")]
    Export { key: String, reason: String },
    #[error("mock journal: {0}")]
    Journal(String),
}
