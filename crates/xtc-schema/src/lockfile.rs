use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name bundler writes next to the Gemfile.
pub const LOCKFILE_NAME: &str = "Gemfile.lock";

/// Line marker that opens the resolved dependency listing.
pub const SPECS_MARKER: &str = "specs:";

#[derive(Debug, Error)]
pub enum LockfileError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Location of the lock file belonging to `gemfile`.
pub fn lockfile_path(gemfile: &Path) -> PathBuf {
    gemfile
        .parent()
        .map_or_else(|| PathBuf::from(LOCKFILE_NAME), |dir| dir.join(LOCKFILE_NAME))
}

/// Pinned version of `gem` in a Gemfile.lock, or `None` when the gem is not
/// listed under the specs section.
///
/// The section starts at the first line containing `specs:` and ends at the
/// first blank line after it. Within it, the first line carrying
/// `<gem> (<version>)` wins. The gem name is matched literally.
pub fn find_pinned_version(gem: &str, content: &str) -> Option<String> {
    let section = specs_section(content);
    if section.is_empty() {
        return None;
    }

    let pattern = format!(r"{} \((.+)\)", regex::escape(gem));
    let Ok(re) = Regex::new(&pattern) else {
        debug!("gem name '{gem}' does not produce a usable pattern");
        return None;
    };

    section
        .iter()
        .find_map(|line| re.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

fn specs_section(content: &str) -> Vec<&str> {
    let mut lines = content.lines();
    let Some(first) = lines.by_ref().find(|line| line.contains(SPECS_MARKER)) else {
        return Vec::new();
    };

    let mut section = vec![first];
    section.extend(lines.take_while(|line| !line.trim().is_empty()));
    section
}

/// A Gemfile.lock read from disk.
#[derive(Debug, Clone)]
pub struct GemfileLock {
    path: PathBuf,
    content: String,
}

impl GemfileLock {
    pub fn read(path: &Path) -> Result<Self, LockfileError> {
        let content = std::fs::read_to_string(path).map_err(|source| LockfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_content(path, content))
    }

    pub fn from_content(path: &Path, content: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn pinned_version(&self, gem: &str) -> Option<String> {
        find_pinned_version(gem, &self.content)
    }
}
