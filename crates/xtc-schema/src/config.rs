use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Value of the async input that turns on `--async` submission.
pub const ASYNC_ENABLED: &str = "yes";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no {0} parameter specified")]
    Missing(&'static str),
    #[error("{name} does not exist at: {}", .path.display())]
    NotFound { name: &'static str, path: PathBuf },
    #[error("{name} is not a directory: {}", .path.display())]
    NotADirectory { name: &'static str, path: PathBuf },
    #[error("failed to check if {name} exists at {}: {source}", .path.display())]
    Check {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to expand {name} ({}): {source}", .path.display())]
    Expand {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Raw step inputs as handed over by the environment. Empty strings count
/// as unset.
#[derive(Debug, Clone, Default)]
pub struct StepInputs {
    pub work_dir: Option<String>,
    pub gemfile: Option<String>,
    pub ipa_path: Option<String>,
    pub dsym_path: Option<String>,
    pub user: Option<String>,
    pub api_key: Option<String>,
    pub devices: Option<String>,
    pub is_async: Option<String>,
    pub series: Option<String>,
    pub custom_options: Option<String>,
}

/// Everything the step needs to install the tooling and submit the app.
///
/// Built once from [`StepInputs`], then checked with [`validate`] and
/// anchored with [`absolutize`]. Never mutated afterwards.
///
/// [`validate`]: SubmissionConfig::validate
/// [`absolutize`]: SubmissionConfig::absolutize
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionConfig {
    pub work_dir: PathBuf,
    pub gemfile: Option<PathBuf>,
    pub ipa_path: PathBuf,
    pub dsym_path: Option<PathBuf>,
    pub user: String,
    #[serde(skip)]
    pub api_key: String,
    pub devices: String,
    pub is_async: String,
    pub series: Option<String>,
    pub custom_options: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    non_empty(value).ok_or(ConfigError::Missing(name))
}

impl SubmissionConfig {
    pub fn from_inputs(inputs: StepInputs) -> Result<Self, ConfigError> {
        Ok(Self {
            work_dir: PathBuf::from(required(inputs.work_dir, "work_dir")?),
            gemfile: non_empty(inputs.gemfile).map(PathBuf::from),
            ipa_path: PathBuf::from(required(inputs.ipa_path, "ipa_path")?),
            dsym_path: non_empty(inputs.dsym_path).map(PathBuf::from),
            user: required(inputs.user, "xamarin_user")?,
            api_key: required(inputs.api_key, "test_cloud_api_key")?,
            devices: required(inputs.devices, "test_cloud_devices")?,
            is_async: inputs.is_async.unwrap_or_default(),
            series: non_empty(inputs.series),
            custom_options: non_empty(inputs.custom_options),
        })
    }

    /// Check that every referenced path exists with the expected kind.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_dir("work_dir", &self.work_dir)?;
        require_path("ipa_path", &self.ipa_path)?;
        if let Some(dsym) = &self.dsym_path {
            require_dir("dsym_path", dsym)?;
        }
        Ok(())
    }

    /// Rewrite `work_dir` and `gemfile` as absolute paths, expanding `~/`.
    pub fn absolutize(self) -> Result<Self, ConfigError> {
        let work_dir = absolute("work_dir", &self.work_dir)?;
        let gemfile = self
            .gemfile
            .as_deref()
            .map(|g| absolute("gem_file_path", g))
            .transpose()?;
        Ok(Self {
            work_dir,
            gemfile,
            ..self
        })
    }

    pub fn is_async(&self) -> bool {
        self.is_async == ASYNC_ENABLED
    }

    /// Name/value pairs for logging, with the API key masked.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        fn opt_path(p: Option<&PathBuf>) -> String {
            p.map(|p| p.display().to_string()).unwrap_or_default()
        }
        vec![
            ("work_dir", self.work_dir.display().to_string()),
            ("gem_file_path", opt_path(self.gemfile.as_ref())),
            ("ipa_path", self.ipa_path.display().to_string()),
            ("dsym_path", opt_path(self.dsym_path.as_ref())),
            ("xamarin_user", self.user.clone()),
            ("test_cloud_api_key", "***".to_owned()),
            ("test_cloud_devices", self.devices.clone()),
            ("test_cloud_is_async", self.is_async.clone()),
            ("test_cloud_series", self.series.clone().unwrap_or_default()),
            (
                "other_parameters",
                self.custom_options.clone().unwrap_or_default(),
            ),
        ]
    }
}

fn require_path(name: &'static str, path: &Path) -> Result<(), ConfigError> {
    match path.try_exists() {
        Ok(true) => Ok(()),
        Ok(false) => Err(ConfigError::NotFound {
            name,
            path: path.to_path_buf(),
        }),
        Err(source) => Err(ConfigError::Check {
            name,
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn require_dir(name: &'static str, path: &Path) -> Result<(), ConfigError> {
    require_path(name, path)?;
    if path.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::NotADirectory {
            name,
            path: path.to_path_buf(),
        })
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}

fn absolute(name: &'static str, path: &Path) -> Result<PathBuf, ConfigError> {
    std::path::absolute(expand_tilde(path)).map_err(|source| ConfigError::Expand {
        name,
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(dir: &Path) -> StepInputs {
        let ipa = dir.join("app.ipa");
        std::fs::write(&ipa, b"ipa").unwrap();
        StepInputs {
            work_dir: Some(dir.display().to_string()),
            ipa_path: Some(ipa.display().to_string()),
            user: Some("bob".to_owned()),
            api_key: Some("KEY".to_owned()),
            devices: Some("iphone6".to_owned()),
            is_async: Some("yes".to_owned()),
            ..StepInputs::default()
        }
    }

    #[test]
    fn valid_inputs_build_and_validate() {
        let dir = tempfile::tempdir().unwrap();
        let config = SubmissionConfig::from_inputs(inputs(dir.path())).unwrap();
        config.validate().unwrap();
        assert!(config.is_async());
        assert_eq!(config.series, None);
        assert_eq!(config.custom_options, None);
    }

    #[test]
    fn empty_required_input_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut i = inputs(dir.path());
        i.user = Some(String::new());
        let err = SubmissionConfig::from_inputs(i).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("xamarin_user")));
        assert_eq!(err.to_string(), "no xamarin_user parameter specified");
    }

    #[test]
    fn each_required_input_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let cases: [(fn(&mut StepInputs), &str); 5] = [
            (|i| i.work_dir = None, "work_dir"),
            (|i| i.ipa_path = None, "ipa_path"),
            (|i| i.api_key = None, "test_cloud_api_key"),
            (|i| i.devices = None, "test_cloud_devices"),
            (|i| i.user = None, "xamarin_user"),
        ];
        for (clear, name) in cases {
            let mut i = inputs(dir.path());
            clear(&mut i);
            match SubmissionConfig::from_inputs(i) {
                Err(ConfigError::Missing(n)) => assert_eq!(n, name),
                other => panic!("expected Missing({name}), got {other:?}"),
            }
        }
    }

    #[test]
    fn async_only_for_exact_yes() {
        let dir = tempfile::tempdir().unwrap();
        for (value, expected) in [("yes", true), ("Yes", false), ("true", false), ("", false)] {
            let mut i = inputs(dir.path());
            i.is_async = Some(value.to_owned());
            let config = SubmissionConfig::from_inputs(i).unwrap();
            assert_eq!(config.is_async(), expected, "is_async={value:?}");
        }
    }

    #[test]
    fn optional_empty_inputs_are_unset() {
        let dir = tempfile::tempdir().unwrap();
        let mut i = inputs(dir.path());
        i.series = Some(String::new());
        i.custom_options = Some(String::new());
        i.gemfile = Some(String::new());
        let config = SubmissionConfig::from_inputs(i).unwrap();
        assert_eq!(config.series, None);
        assert_eq!(config.custom_options, None);
        assert_eq!(config.gemfile, None);
    }

    #[test]
    fn missing_work_dir_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut i = inputs(dir.path());
        i.work_dir = Some(dir.path().join("nope").display().to_string());
        let err = SubmissionConfig::from_inputs(i)
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { name: "work_dir", .. }));
    }

    #[test]
    fn work_dir_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut i = inputs(dir.path());
        i.work_dir = i.ipa_path.clone();
        let err = SubmissionConfig::from_inputs(i)
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotADirectory {
                name: "work_dir",
                ..
            }
        ));
    }

    #[test]
    fn missing_ipa_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut i = inputs(dir.path());
        i.ipa_path = Some(dir.path().join("missing.ipa").display().to_string());
        let err = SubmissionConfig::from_inputs(i)
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("ipa_path"));
    }

    #[test]
    fn dsym_must_be_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut i = inputs(dir.path());
        i.dsym_path = Some(dir.path().join("app.dSYM").display().to_string());
        let config = SubmissionConfig::from_inputs(i).unwrap();
        assert!(config.validate().is_err());

        std::fs::create_dir(dir.path().join("app.dSYM")).unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn absolutize_anchors_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut i = inputs(dir.path());
        i.work_dir = Some(".".to_owned());
        i.gemfile = Some("calabash/Gemfile".to_owned());
        let config = SubmissionConfig::from_inputs(i)
            .unwrap()
            .absolutize()
            .unwrap();
        assert!(config.work_dir.is_absolute());
        let gemfile = config.gemfile.unwrap();
        assert!(gemfile.is_absolute());
        assert!(gemfile.ends_with("calabash/Gemfile"));
    }

    #[test]
    fn summary_masks_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = SubmissionConfig::from_inputs(inputs(dir.path())).unwrap();
        let summary = config.summary();
        assert!(summary
            .iter()
            .any(|(k, v)| *k == "test_cloud_api_key" && v == "***"));
        assert!(!summary.iter().any(|(_, v)| v == "KEY"));
    }
}
