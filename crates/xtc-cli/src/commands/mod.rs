pub mod completions;
pub mod man_pages;
pub mod plan;
pub mod run;

use console::Style;
use xtc_core::FailureKind;
use xtc_runtime::runner::RUNNER_ENV;
use xtc_runtime::{select_runner, CommandRunner};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_MANIFEST_ERROR: u8 = 3;
pub const EXIT_OPTIONS_ERROR: u8 = 4;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn exit_code_for(kind: FailureKind) -> u8 {
    match kind {
        FailureKind::ConfigInvalid => EXIT_CONFIG_ERROR,
        FailureKind::ManifestUnreadable => EXIT_MANIFEST_ERROR,
        FailureKind::MalformedCustomOptions => EXIT_OPTIONS_ERROR,
        FailureKind::CommandFailed => EXIT_FAILURE,
    }
}

/// Runner named by `XTC_RUNNER`, the system runner when unset.
pub fn make_runner() -> Result<Box<dyn CommandRunner>, String> {
    let name = std::env::var(RUNNER_ENV).unwrap_or_else(|_| "system".to_owned());
    select_runner(&name).map_err(|e| e.to_string())
}

pub fn done(msg: &str) -> String {
    format!("{} {msg}", Style::new().green().apply_to("✓"))
}

pub fn failed(msg: &str) -> String {
    format!("{} {msg}", Style::new().red().apply_to("✗"))
}

pub fn heading(title: &str) -> String {
    Style::new().bold().apply_to(title).to_string()
}
