use crate::command::InvocationPlan;
use crate::RuntimeError;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use tracing::debug;

/// Selects the runner the binary uses (`system` or `mock`).
pub const RUNNER_ENV: &str = "XTC_RUNNER";

/// When set, the mock runner appends every plan it receives to this file
/// as one JSON document per line.
pub const MOCK_JOURNAL_ENV: &str = "XTC_MOCK_JOURNAL";

/// Executes invocation plans. Each call runs one command to completion.
pub trait CommandRunner: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, plan: &InvocationPlan) -> Result<(), RuntimeError>;
}

pub fn select_runner(name: &str) -> Result<Box<dyn CommandRunner>, RuntimeError> {
    match name {
        "system" => Ok(Box::new(SystemRunner)),
        "mock" => {
            let runner = match std::env::var_os(MOCK_JOURNAL_ENV) {
                Some(path) => MockRunner::new().with_journal(PathBuf::from(path)),
                None => MockRunner::new(),
            };
            Ok(Box::new(runner))
        }
        other => Err(RuntimeError::RunnerUnavailable(other.to_owned())),
    }
}

/// Spawns real processes, streaming their output to ours.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn name(&self) -> &'static str {
        "system"
    }

    fn run(&self, plan: &InvocationPlan) -> Result<(), RuntimeError> {
        let program = plan.program().ok_or(RuntimeError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(plan.args())
            .envs(plan.envs.iter().map(|(k, v)| (k, v)))
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &plan.dir {
            cmd.current_dir(dir);
        }
        if plan.stdin.is_some() {
            cmd.stdin(Stdio::piped());
        }

        let mut child = cmd.spawn().map_err(|source| RuntimeError::Spawn {
            program: program.to_owned(),
            source,
        })?;

        if let Some(input) = &plan.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input.as_bytes())?;
            }
        }

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(RuntimeError::CommandFailed {
                program: program.to_owned(),
                status: status.code(),
            })
        }
    }
}

/// Records plans instead of running them. Optionally fails any plan whose
/// program matches, to exercise error paths.
#[derive(Debug, Default)]
pub struct MockRunner {
    recorded: Mutex<Vec<InvocationPlan>>,
    fail_program: Option<String>,
    journal: Option<PathBuf>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every plan whose argv contains `program`.
    #[must_use]
    pub fn failing_on(mut self, program: &str) -> Self {
        self.fail_program = Some(program.to_owned());
        self
    }

    #[must_use]
    pub fn with_journal(mut self, path: PathBuf) -> Self {
        self.journal = Some(path);
        self
    }

    pub fn recorded(&self) -> Vec<InvocationPlan> {
        self.recorded
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn append_journal(&self, plan: &InvocationPlan) -> Result<(), RuntimeError> {
        let Some(path) = &self.journal else {
            return Ok(());
        };
        let line = serde_json::to_string(plan)
            .map_err(|e| RuntimeError::Journal(format!("serialize: {e}")))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl CommandRunner for MockRunner {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn run(&self, plan: &InvocationPlan) -> Result<(), RuntimeError> {
        let program = plan.program().ok_or(RuntimeError::EmptyCommand)?;
        debug!("mock runner: {program}");

        self.recorded
            .lock()
            .map_err(|e| RuntimeError::Journal(format!("mutex poisoned: {e}")))?
            .push(plan.clone());
        self.append_journal(plan)?;

        if let Some(fail) = &self.fail_program {
            if plan.argv.iter().any(|a| a == fail) {
                return Err(RuntimeError::CommandFailed {
                    program: program.to_owned(),
                    status: Some(1),
                });
            }
        }
        Ok(())
    }
}
