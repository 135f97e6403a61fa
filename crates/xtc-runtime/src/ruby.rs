use crate::command::InvocationPlan;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Command;
use std::str::FromStr;
use tracing::debug;

/// Overrides ruby detection, e.g. for hermetic CI or tests.
pub const RUBY_INSTALL_TYPE_ENV: &str = "XTC_RUBY_INSTALL_TYPE";

const SYSTEM_RUBY: &str = "/usr/bin/ruby";
const BREW_RUBY: [&str; 2] = ["/usr/local/bin/ruby", "/opt/homebrew/bin/ruby"];

/// How the active ruby was installed. Decides whether gem and bundler
/// commands need `sudo` and whether rbenv shims must be rehashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RubyInstallType {
    System,
    Brew,
    Rbenv,
    Rvm,
    Unknown,
}

impl RubyInstallType {
    pub fn from_ruby_path(path: &str) -> Self {
        let path = path.trim();
        if path.is_empty() {
            Self::Unknown
        } else if path == SYSTEM_RUBY {
            Self::System
        } else if BREW_RUBY.contains(&path) {
            Self::Brew
        } else if path.contains("/.rbenv/") {
            Self::Rbenv
        } else if path.contains("/.rvm/") {
            Self::Rvm
        } else {
            Self::Unknown
        }
    }

    /// Detect from `XTC_RUBY_INSTALL_TYPE`, falling back to `which ruby`.
    pub fn detect() -> Self {
        if let Ok(value) = std::env::var(RUBY_INSTALL_TYPE_ENV) {
            match value.parse() {
                Ok(kind) => return kind,
                Err(e) => debug!("ignoring {RUBY_INSTALL_TYPE_ENV}: {e}"),
            }
        }

        let path = Command::new("which")
            .arg("ruby")
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_owned())
            .unwrap_or_default();
        let kind = Self::from_ruby_path(&path);
        debug!("ruby at '{path}' detected as {kind}");
        kind
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Brew => "brew",
            Self::Rbenv => "rbenv",
            Self::Rvm => "rvm",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RubyInstallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RubyInstallType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "brew" => Ok(Self::Brew),
            "rbenv" => Ok(Self::Rbenv),
            "rvm" => Ok(Self::Rvm),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown ruby install type '{other}'")),
        }
    }
}

/// Whether `argv` modifies the system gem directory and so needs `sudo`.
fn sudo_needed(install_type: RubyInstallType, argv: &[&str]) -> bool {
    if install_type != RubyInstallType::System {
        return false;
    }
    match argv {
        ["gem", command, ..] => matches!(*command, "install" | "uninstall"),
        // `bundle _2.0.1_ install` pins the bundler version before the command.
        ["bundle", version, command, ..] if version.starts_with('_') && version.ends_with('_') => {
            matches!(*command, "install" | "update")
        }
        ["bundle", command, ..] => matches!(*command, "install" | "update"),
        _ => false,
    }
}

/// Build a ruby tool command, prefixed with `sudo` where the install type
/// requires it.
pub fn ruby_command(install_type: RubyInstallType, argv: &[&str]) -> InvocationPlan {
    if sudo_needed(install_type, argv) {
        InvocationPlan::new(std::iter::once("sudo").chain(argv.iter().copied()))
    } else {
        InvocationPlan::new(argv.iter().copied())
    }
}

/// Commands installing `gem` globally: the install itself, then an rbenv
/// rehash so new executables get shims.
pub fn gem_install(
    install_type: RubyInstallType,
    gem: &str,
    version: Option<&str>,
) -> Vec<InvocationPlan> {
    let mut argv = vec!["gem", "install", gem, "--no-document"];
    if let Some(v) = version {
        argv.extend(["-v", v]);
    }

    let mut commands = vec![ruby_command(install_type, &argv)];
    if install_type == RubyInstallType::Rbenv {
        commands.push(ruby_command(install_type, &["rbenv", "rehash"]));
    }
    commands
}
