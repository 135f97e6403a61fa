use crate::install::plan_installation;
use crate::strategy::{resolve_strategies, StrategySelection};
use crate::submit::build_submission_invocation;
use crate::CoreError;
use serde::Serialize;
use std::fmt;
use tracing::info;
use xtc_runtime::{CommandRunner, InvocationPlan, RubyInstallType};
use xtc_schema::{StepInputs, SubmissionConfig};

/// Step phase in which a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validate,
    Resolve,
    Select,
    Assemble,
    Install,
    Submit,
}

impl Stage {
    fn describe(self) -> &'static str {
        match self {
            Self::Validate => "issue with input",
            Self::Resolve => "failed to expand input paths",
            Self::Select => "failed to determine cucumber & test-cloud versions",
            Self::Assemble => "failed to assemble submit command",
            Self::Install => "failed to install gems",
            Self::Submit => "failed to submit",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ConfigInvalid,
    ManifestUnreadable,
    MalformedCustomOptions,
    CommandFailed,
}

/// Why a run failed. The caller turns this into the exported failure
/// signal and a non-zero exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureInfo {
    pub stage: Stage,
    pub kind: FailureKind,
    pub message: String,
}

impl FailureInfo {
    pub fn new(stage: Stage, error: &CoreError) -> Self {
        Self {
            stage,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for FailureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

impl std::error::Error for FailureInfo {}

/// Every command a run will execute, decided before any of them starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunPlan {
    pub strategies: StrategySelection,
    pub ruby: RubyInstallType,
    pub install: Vec<InvocationPlan>,
    pub submission: InvocationPlan,
}

impl RunPlan {
    #[must_use]
    pub fn redacted(&self, secret: &str) -> Self {
        Self {
            strategies: self.strategies.clone(),
            ruby: self.ruby,
            install: self.install.iter().map(|p| p.redacted(secret)).collect(),
            submission: self.submission.redacted(secret),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessInfo {
    pub strategies: StrategySelection,
    pub commands_run: usize,
    pub submission: InvocationPlan,
}

/// Drives one run: validate inputs, pick strategies, assemble every
/// command, then install and submit in order.
pub struct Pipeline<'a> {
    runner: &'a dyn CommandRunner,
    ruby: RubyInstallType,
}

impl<'a> Pipeline<'a> {
    pub fn new(runner: &'a dyn CommandRunner, ruby: RubyInstallType) -> Self {
        Self { runner, ruby }
    }

    /// Validate and plan without running anything.
    pub fn prepare(&self, inputs: StepInputs) -> Result<(SubmissionConfig, RunPlan), FailureInfo> {
        let fail = |stage: Stage| move |e: CoreError| FailureInfo::new(stage, &e);

        let config = SubmissionConfig::from_inputs(inputs)
            .map_err(CoreError::from)
            .map_err(fail(Stage::Validate))?;
        info!("Configs:");
        for (key, value) in config.summary() {
            info!("- {key}: {value}");
        }
        config
            .validate()
            .map_err(CoreError::from)
            .map_err(fail(Stage::Validate))?;

        let config = config
            .absolutize()
            .map_err(CoreError::from)
            .map_err(fail(Stage::Resolve))?;

        info!("Determining cucumber & test-cloud version...");
        let strategies =
            resolve_strategies(config.gemfile.as_deref()).map_err(fail(Stage::Select))?;
        strategies.log();

        let submission = build_submission_invocation(&config, &strategies.test_cloud)
            .map_err(fail(Stage::Assemble))?;
        let install = plan_installation(&strategies, self.ruby);

        let plan = RunPlan {
            strategies,
            ruby: self.ruby,
            install,
            submission,
        };
        Ok((config, plan))
    }

    /// Run a prepared plan. Installation finishes before submission starts
    /// and the first failing command ends the run.
    pub fn execute(
        &self,
        config: &SubmissionConfig,
        plan: RunPlan,
    ) -> Result<SuccessInfo, FailureInfo> {
        let mut commands_run = 0;

        info!("Installing cucumber & test-cloud gems...");
        for cmd in &plan.install {
            self.run_logged(cmd, &config.api_key)
                .map_err(|e| FailureInfo::new(Stage::Install, &e))?;
            commands_run += 1;
        }

        info!("Submitting {}...", config.ipa_path.display());
        self.run_logged(&plan.submission, &config.api_key)
            .map_err(|e| FailureInfo::new(Stage::Submit, &e))?;
        commands_run += 1;

        Ok(SuccessInfo {
            strategies: plan.strategies,
            commands_run,
            submission: plan.submission.redacted(&config.api_key),
        })
    }

    pub fn run(&self, inputs: StepInputs) -> Result<SuccessInfo, FailureInfo> {
        let (config, plan) = self.prepare(inputs)?;
        self.execute(&config, plan)
    }

    fn run_logged(&self, cmd: &InvocationPlan, secret: &str) -> Result<(), CoreError> {
        info!("$ {}", cmd.redacted(secret).printable());
        self.runner.run(cmd)?;
        Ok(())
    }
}
