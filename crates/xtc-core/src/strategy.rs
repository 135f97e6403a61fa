use crate::CoreError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use xtc_schema::{find_pinned_version, lockfile_path, GemfileLock};

/// Test-runner framework gem.
pub const CUCUMBER_GEM: &str = "cucumber";

/// Submission client gem providing the `test-cloud` executable.
pub const TEST_CLOUD_GEM: &str = "xamarin-test-cloud";

/// How one gem is provided for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Strategy {
    /// Pinned in the Gemfile.lock; installed and run through bundler.
    Managed { gemfile: PathBuf, version: String },
    /// Not pinned; latest version installed globally.
    Latest,
}

impl Strategy {
    pub fn is_managed(&self) -> bool {
        matches!(self, Self::Managed { .. })
    }

    pub fn gemfile(&self) -> Option<&Path> {
        match self {
            Self::Managed { gemfile, .. } => Some(gemfile),
            Self::Latest => None,
        }
    }

    fn from_lock(gem: &str, gemfile: &Path, lock_content: &str) -> Self {
        match find_pinned_version(gem, lock_content) {
            Some(version) => Self::Managed {
                gemfile: gemfile.to_path_buf(),
                version,
            },
            None => Self::Latest,
        }
    }
}

/// Strategy for each of the two gems the step needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategySelection {
    pub cucumber: Strategy,
    pub test_cloud: Strategy,
}

impl StrategySelection {
    pub fn latest() -> Self {
        Self {
            cucumber: Strategy::Latest,
            test_cloud: Strategy::Latest,
        }
    }

    /// The Gemfile bundler must install, if any gem is managed.
    pub fn bundler_gemfile(&self) -> Option<&Path> {
        self.cucumber.gemfile().or_else(|| self.test_cloud.gemfile())
    }

    pub fn per_gem(&self) -> [(&'static str, &Strategy); 2] {
        [
            (CUCUMBER_GEM, &self.cucumber),
            (TEST_CLOUD_GEM, &self.test_cloud),
        ]
    }

    pub fn log(&self) {
        for (gem, strategy) in self.per_gem() {
            match strategy {
                Strategy::Managed { version, .. } => {
                    info!("using {gem} {version} with bundler");
                }
                Strategy::Latest => info!("using {gem} latest version"),
            }
        }
    }
}

/// Decide strategies from an optional Gemfile path and the text of its
/// lock file (`None` when the lock file does not exist).
///
/// Without a Gemfile everything is installed at the latest version,
/// whatever lock content is passed.
pub fn select_strategies(gemfile: Option<&Path>, lock_content: Option<&str>) -> StrategySelection {
    let (Some(gemfile), Some(content)) = (gemfile, lock_content) else {
        return StrategySelection::latest();
    };
    StrategySelection {
        cucumber: Strategy::from_lock(CUCUMBER_GEM, gemfile, content),
        test_cloud: Strategy::from_lock(TEST_CLOUD_GEM, gemfile, content),
    }
}

/// Look up the Gemfile and its lock file on disk, then select strategies.
///
/// A missing Gemfile or Gemfile.lock is a warning and falls back to the
/// latest strategy. A lock file that exists but cannot be read is an error.
pub fn resolve_strategies(gemfile: Option<&Path>) -> Result<StrategySelection, CoreError> {
    let Some(gemfile) = gemfile else {
        return Ok(StrategySelection::latest());
    };

    if !exists(gemfile)? {
        warn!("Gemfile not found at: {}", gemfile.display());
        return Ok(StrategySelection::latest());
    }
    info!("Gemfile exists at: {}", gemfile.display());

    let lock_path = lockfile_path(gemfile);
    if !exists(&lock_path)? {
        warn!("Gemfile.lock not found at: {}", lock_path.display());
        return Ok(StrategySelection::latest());
    }
    info!("Gemfile.lock exists at: {}", lock_path.display());

    let lock = GemfileLock::read(&lock_path)?;
    let selection = select_strategies(Some(gemfile), Some(lock.content()));
    for (gem, strategy) in selection.per_gem() {
        if let Strategy::Managed { version, .. } = strategy {
            info!("{gem} version in Gemfile.lock: {version}");
        }
    }
    Ok(selection)
}

fn exists(path: &Path) -> Result<bool, CoreError> {
    path.try_exists()
        .map_err(|source| CoreError::ManifestUnreadable {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PINNED_CUCUMBER: &str = "GEM\n  remote: https://rubygems.org/\n  specs:\n    cucumber (3.1.0)\n    rake (12.3.0)\n\nPLATFORMS\n  ruby\n";

    const PINNED_BOTH: &str = "GEM\n  specs:\n    cucumber (2.4.0)\n    xamarin-test-cloud (2.1.2)\n\n";

    #[test]
    fn pinned_cucumber_only() {
        let gemfile = Path::new("/proj/Gemfile");
        let s = select_strategies(Some(gemfile), Some(PINNED_CUCUMBER));
        assert_eq!(
            s.cucumber,
            Strategy::Managed {
                gemfile: gemfile.to_path_buf(),
                version: "3.1.0".to_owned()
            }
        );
        assert_eq!(s.test_cloud, Strategy::Latest);
        assert!(s.cucumber.is_managed());
        assert!(!s.test_cloud.is_managed());
    }

    #[test]
    fn calabash_cucumber_entry_manages_cucumber() {
        let gemfile = Path::new("/proj/Gemfile");
        let lock = "GEM\n  specs:\n    calabash-cucumber (0.19.2)\n\n";
        let s = select_strategies(Some(gemfile), Some(lock));
        assert!(s.cucumber.is_managed());
        assert_eq!(s.test_cloud, Strategy::Latest);
    }

    #[test]
    fn no_gemfile_means_latest_regardless_of_lock() {
        assert_eq!(
            select_strategies(None, Some(PINNED_BOTH)),
            StrategySelection::latest()
        );
        assert_eq!(select_strategies(None, None), StrategySelection::latest());
    }

    #[test]
    fn missing_lock_means_latest() {
        assert_eq!(
            select_strategies(Some(Path::new("/proj/Gemfile")), None),
            StrategySelection::latest()
        );
    }

    #[test]
    fn bundler_gemfile_follows_managed_gems() {
        let gemfile = Path::new("/proj/Gemfile");
        assert_eq!(StrategySelection::latest().bundler_gemfile(), None);
        let both = select_strategies(Some(gemfile), Some(PINNED_BOTH));
        assert_eq!(both.bundler_gemfile(), Some(gemfile));
        let lock = "  specs:\n    xamarin-test-cloud (2.1.2)\n\n";
        let client_only = select_strategies(Some(gemfile), Some(lock));
        assert!(!client_only.cucumber.is_managed());
        assert_eq!(client_only.bundler_gemfile(), Some(gemfile));
    }

    #[test]
    fn resolve_without_gemfile_touches_nothing() {
        assert_eq!(resolve_strategies(None).unwrap(), StrategySelection::latest());
    }

    #[test]
    fn resolve_missing_gemfile_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let s = resolve_strategies(Some(&dir.path().join("Gemfile"))).unwrap();
        assert_eq!(s, StrategySelection::latest());
    }

    #[test]
    fn resolve_missing_lock_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let gemfile = dir.path().join("Gemfile");
        std::fs::write(&gemfile, "gem 'cucumber'\n").unwrap();
        let s = resolve_strategies(Some(&gemfile)).unwrap();
        assert_eq!(s, StrategySelection::latest());
    }

    #[test]
    fn resolve_reads_lock_next_to_gemfile() {
        let dir = tempfile::tempdir().unwrap();
        let gemfile = dir.path().join("Gemfile");
        std::fs::write(&gemfile, "gem 'cucumber'\ngem 'xamarin-test-cloud'\n").unwrap();
        std::fs::write(dir.path().join("Gemfile.lock"), PINNED_BOTH).unwrap();
        let s = resolve_strategies(Some(&gemfile)).unwrap();
        assert!(s.cucumber.is_managed());
        assert!(s.test_cloud.is_managed());
    }

    #[test]
    fn unreadable_lock_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let gemfile = dir.path().join("Gemfile");
        std::fs::write(&gemfile, "").unwrap();
        // A directory where the lock file should be exists but cannot be read.
        std::fs::create_dir(dir.path().join("Gemfile.lock")).unwrap();
        let err = resolve_strategies(Some(&gemfile)).unwrap_err();
        assert!(matches!(err, CoreError::ManifestUnreadable { .. }));
    }

    #[test]
    fn strategy_serializes_with_tag() {
        let json = serde_json::to_value(Strategy::Latest).unwrap();
        assert_eq!(json["strategy"], "latest");
        let managed = Strategy::Managed {
            gemfile: PathBuf::from("/p/Gemfile"),
            version: "1.0".to_owned(),
        };
        let json = serde_json::to_value(managed).unwrap();
        assert_eq!(json["strategy"], "managed");
        assert_eq!(json["version"], "1.0");
    }
}
