//! Step configuration and Gemfile.lock scanning for xtc-submit.
//!
//! This crate defines the input layer: raw step inputs (`StepInputs`), the
//! validated submission record (`SubmissionConfig`), and the lock-file
//! scanner that reports which gems bundler has pinned (`find_pinned_version`).

pub mod config;
pub mod lockfile;

pub use config::{ConfigError, StepInputs, SubmissionConfig, ASYNC_ENABLED};
pub use lockfile::{
    find_pinned_version, lockfile_path, GemfileLock, LockfileError, LOCKFILE_NAME, SPECS_MARKER,
};
