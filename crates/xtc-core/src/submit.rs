use crate::shell::split_shell_tokens;
use crate::strategy::Strategy;
use crate::CoreError;
use xtc_runtime::InvocationPlan;
use xtc_schema::SubmissionConfig;

/// Executable installed by the xamarin-test-cloud gem.
pub const TEST_CLOUD_BIN: &str = "test-cloud";

/// Environment variable telling bundler which Gemfile to load.
pub const BUNDLE_GEMFILE_ENV: &str = "BUNDLE_GEMFILE";

/// Build the `test-cloud submit` invocation.
///
/// Argument order is fixed: optional `bundle exec`, `test-cloud submit`,
/// binary path, API key, `--user=`, `--devices=`, `--async` when the async
/// input is exactly `yes`, `--series=` when set, then the custom options
/// split into words. The process runs in the configured work dir.
pub fn build_submission_invocation(
    config: &SubmissionConfig,
    test_cloud: &Strategy,
) -> Result<InvocationPlan, CoreError> {
    let custom = match &config.custom_options {
        Some(raw) => split_shell_tokens(raw)?,
        None => Vec::new(),
    };

    let mut argv: Vec<String> = Vec::new();
    if test_cloud.is_managed() {
        argv.extend(["bundle".to_owned(), "exec".to_owned()]);
    }
    argv.extend([
        TEST_CLOUD_BIN.to_owned(),
        "submit".to_owned(),
        config.ipa_path.display().to_string(),
        config.api_key.clone(),
        format!("--user={}", config.user),
        format!("--devices={}", config.devices),
    ]);
    if config.is_async() {
        argv.push("--async".to_owned());
    }
    if let Some(series) = &config.series {
        argv.push(format!("--series={series}"));
    }
    argv.extend(custom);

    let mut plan = InvocationPlan::new(argv).with_dir(&config.work_dir);
    if let Some(gemfile) = test_cloud.gemfile() {
        plan = plan.with_env(BUNDLE_GEMFILE_ENV, &gemfile.to_string_lossy());
    }
    Ok(plan)
}
