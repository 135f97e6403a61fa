use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A fully resolved external command: argv, environment overlay, working
/// directory and optional stdin payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationPlan {
    pub argv: Vec<String>,
    #[serde(default)]
    pub envs: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
}

impl InvocationPlan {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            envs: Vec::new(),
            dir: None,
            stdin: None,
        }
    }

    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_owned(), value.to_owned()));
        self
    }

    #[must_use]
    pub fn with_dir(mut self, dir: &Path) -> Self {
        self.dir = Some(dir.to_path_buf());
        self
    }

    #[must_use]
    pub fn with_stdin(mut self, input: &str) -> Self {
        self.stdin = Some(input.to_owned());
        self
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    /// Copy of this plan with every occurrence of `secret` masked, for
    /// logging and dry-run output.
    #[must_use]
    pub fn redacted(&self, secret: &str) -> Self {
        if secret.is_empty() {
            return self.clone();
        }
        let mask = |s: &String| s.replace(secret, "***");
        Self {
            argv: self.argv.iter().map(mask).collect(),
            envs: self
                .envs
                .iter()
                .map(|(k, v)| (k.clone(), mask(v)))
                .collect(),
            dir: self.dir.clone(),
            stdin: self.stdin.as_ref().map(mask),
        }
    }

    /// Shell-quoted one-liner, environment assignments first, suitable for
    /// copy-pasting into a terminal.
    pub fn printable(&self) -> String {
        let envs = self.envs.iter().map(|(k, v)| format!("{k}={}", quote(v)));
        let argv = self.argv.iter().map(|a| quote(a));
        envs.chain(argv).collect::<Vec<_>>().join(" ")
    }
}

fn quote(word: &str) -> String {
    shlex::try_quote(word).map_or_else(|_| word.to_owned(), |q| q.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_and_args() {
        let plan = InvocationPlan::new(["gem", "install", "cucumber"]);
        assert_eq!(plan.program(), Some("gem"));
        assert_eq!(plan.args(), ["install", "cucumber"]);
        assert!(InvocationPlan::new(Vec::<String>::new()).args().is_empty());
    }

    #[test]
    fn printable_quotes_words_with_spaces() {
        let plan = InvocationPlan::new(["test-cloud", "submit", "my app.ipa"])
            .with_env("BUNDLE_GEMFILE", "/tmp/Gemfile");
        assert_eq!(
            plan.printable(),
            "BUNDLE_GEMFILE=/tmp/Gemfile test-cloud submit 'my app.ipa'"
        );
    }

    #[test]
    fn redacted_masks_secret_everywhere() {
        let plan = InvocationPlan::new(["test-cloud", "submit", "app.ipa", "SECRET"])
            .with_env("TOKEN", "SECRET")
            .with_stdin("SECRET");
        let masked = plan.redacted("SECRET");
        assert_eq!(masked.argv[3], "***");
        assert_eq!(masked.envs[0].1, "***");
        assert_eq!(masked.stdin.as_deref(), Some("***"));
        assert_eq!(plan.redacted(""), plan);
    }

    #[test]
    fn serializes_without_empty_fields() {
        let plan = InvocationPlan::new(["rbenv", "rehash"]);
        let json = serde_json::to_string(&plan).unwrap();
        assert!(!json.contains("stdin"));
        assert!(!json.contains("dir"));
        let back: InvocationPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}
