use super::{exit_code_for, heading, json_pretty, make_runner, EXIT_SUCCESS};
use xtc_core::{Pipeline, RunPlan, Strategy};
use xtc_runtime::RubyInstallType;
use xtc_schema::StepInputs;

pub fn run(inputs: StepInputs, json: bool) -> Result<u8, String> {
    let runner = make_runner()?;
    let pipeline = Pipeline::new(runner.as_ref(), RubyInstallType::detect());

    let (config, plan) = match pipeline.prepare(inputs) {
        Ok(prepared) => prepared,
        Err(failure) => {
            if json {
                let payload = serde_json::json!({ "status": "invalid", "failure": failure });
                println!("{}", json_pretty(&payload)?);
            }
            eprintln!("error: {failure}");
            return Ok(exit_code_for(failure.kind));
        }
    };

    let shown = plan.redacted(&config.api_key);
    if json {
        println!("{}", json_pretty(&shown)?);
    } else {
        print_plan(&shown);
    }
    Ok(EXIT_SUCCESS)
}

fn print_plan(plan: &RunPlan) {
    println!("{}", heading("Strategies"));
    for (gem, strategy) in plan.strategies.per_gem() {
        match strategy {
            Strategy::Managed { version, gemfile } => {
                println!("  {gem}: bundler {version} ({})", gemfile.display());
            }
            Strategy::Latest => println!("  {gem}: latest"),
        }
    }
    println!("  ruby: {}", plan.ruby);

    println!("{}", heading("Install"));
    for cmd in &plan.install {
        println!("  $ {}", cmd.printable());
    }

    println!("{}", heading("Submit"));
    if let Some(dir) = &plan.submission.dir {
        println!("  cd {}", dir.display());
    }
    println!("  $ {}", plan.submission.printable());
}
