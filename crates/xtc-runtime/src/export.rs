use crate::command::InvocationPlan;
use crate::runner::CommandRunner;
use crate::RuntimeError;

/// Key later pipeline steps read to learn whether the submission failed.
pub const RESULT_KEY: &str = "BITRISE_XAMARIN_TEST_RESULT";

pub const RESULT_FAILED: &str = "failed";

/// `envman add --key <key>` with the value on stdin, so values containing
/// newlines or shell metacharacters pass through untouched.
pub fn envman_add(key: &str, value: &str) -> InvocationPlan {
    InvocationPlan::new(["envman", "add", "--key", key]).with_stdin(value)
}

pub fn export_env(runner: &dyn CommandRunner, key: &str, value: &str) -> Result<(), RuntimeError> {
    runner
        .run(&envman_add(key, value))
        .map_err(|e| RuntimeError::Export {
            key: key.to_owned(),
            reason: e.to_string(),
        })
}

/// Publish the failure signal for downstream steps.
pub fn export_failure(runner: &dyn CommandRunner) -> Result<(), RuntimeError> {
    export_env(runner, RESULT_KEY, RESULT_FAILED)
}
