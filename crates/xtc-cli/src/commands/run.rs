use super::{done, exit_code_for, failed, json_pretty, make_runner, EXIT_SUCCESS};
use tracing::warn;
use xtc_core::Pipeline;
use xtc_runtime::{export_failure, CommandRunner, RubyInstallType, SystemRunner, RESULT_KEY};
use xtc_schema::StepInputs;

pub fn run(inputs: StepInputs, json: bool) -> Result<u8, String> {
    let runner = match make_runner() {
        Ok(runner) => runner,
        Err(msg) => {
            // Later steps still need the failure signal.
            report_failure(&SystemRunner);
            return Err(msg);
        }
    };
    let ruby = RubyInstallType::detect();
    let pipeline = Pipeline::new(runner.as_ref(), ruby);

    match pipeline.run(inputs) {
        Ok(success) => {
            if json {
                let payload = serde_json::json!({
                    "status": "submitted",
                    "result": success,
                });
                println!("{}", json_pretty(&payload)?);
            } else {
                println!(
                    "{}",
                    done(&format!("submitted ({} commands run)", success.commands_run))
                );
            }
            Ok(EXIT_SUCCESS)
        }
        Err(failure) => {
            report_failure(runner.as_ref());
            if json {
                let payload = serde_json::json!({
                    "status": "failed",
                    "failure": failure,
                });
                println!("{}", json_pretty(&payload)?);
            } else {
                println!("{}", failed(&failure.stage.to_string()));
            }
            eprintln!("error: {failure}");
            Ok(exit_code_for(failure.kind))
        }
    }
}

fn report_failure(runner: &dyn CommandRunner) {
    if let Err(e) = export_failure(runner) {
        warn!("failed to export {RESULT_KEY}: {e}");
    }
}
