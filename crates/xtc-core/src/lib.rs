//! Decision engine and orchestration for xtc-submit.
//!
//! This crate ties the schema and runtime layers together: it decides per
//! gem whether bundler or a global latest install provides it
//! (`resolve_strategies`), splits user-supplied options into argv words
//! (`split_shell_tokens`), assembles the install and `test-cloud submit`
//! commands, and runs them in order through the `Pipeline`.

pub mod install;
pub mod pipeline;
pub mod shell;
pub mod strategy;
pub mod submit;

pub use install::plan_installation;
pub use pipeline::{FailureInfo, FailureKind, Pipeline, RunPlan, Stage, SuccessInfo};
pub use shell::split_shell_tokens;
pub use strategy::{
    resolve_strategies, select_strategies, Strategy, StrategySelection, CUCUMBER_GEM,
    TEST_CLOUD_GEM,
};
pub use submit::{build_submission_invocation, BUNDLE_GEMFILE_ENV, TEST_CLOUD_BIN};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    ConfigInvalid(#[from] xtc_schema::ConfigError),
    #[error("failed to read {}: {source}", .path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to shell split custom options ({0}): unbalanced quotes or trailing escape")]
    MalformedCustomOptions(String),
    #[error("{0}")]
    Runtime(#[from] xtc_runtime::RuntimeError),
}

impl CoreError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ConfigInvalid(_) => FailureKind::ConfigInvalid,
            Self::ManifestUnreadable { .. } => FailureKind::ManifestUnreadable,
            Self::MalformedCustomOptions(_) => FailureKind::MalformedCustomOptions,
            Self::Runtime(_) => FailureKind::CommandFailed,
        }
    }
}

impl From<xtc_schema::LockfileError> for CoreError {
    fn from(e: xtc_schema::LockfileError) -> Self {
        match e {
            xtc_schema::LockfileError::Io { path, source } => {
                Self::ManifestUnreadable { path, source }
            }
        }
    }
}
