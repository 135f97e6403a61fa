mod commands;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use commands::EXIT_FAILURE;
use std::path::PathBuf;
use std::process::ExitCode;
use xtc_schema::StepInputs;

#[derive(Debug, Parser)]
#[command(
    name = "xtc-submit",
    version,
    about = "Install calabash tooling and submit an app to Xamarin Test Cloud"
)]
struct Cli {
    #[command(flatten)]
    inputs: InputArgs,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Step inputs. Each flag falls back to the environment variable the CI
/// step exposes.
#[derive(Debug, Args)]
struct InputArgs {
    /// Directory test-cloud runs in.
    #[arg(long, env = "work_dir")]
    work_dir: Option<String>,
    /// Gemfile of the calabash project; its Gemfile.lock decides bundler usage.
    #[arg(long, env = "gem_file_path")]
    gem_file_path: Option<String>,
    /// App binary to submit.
    #[arg(long, env = "ipa_path")]
    ipa_path: Option<String>,
    /// Debug symbols directory.
    #[arg(long, env = "dsym_path")]
    dsym_path: Option<String>,
    /// Test Cloud user email.
    #[arg(long, env = "xamarin_user")]
    xamarin_user: Option<String>,
    /// Test Cloud API key.
    #[arg(long, env = "test_cloud_api_key", hide_env_values = true)]
    test_cloud_api_key: Option<String>,
    /// Device selection id.
    #[arg(long, env = "test_cloud_devices")]
    test_cloud_devices: Option<String>,
    /// "yes" submits without waiting for results.
    #[arg(long, env = "test_cloud_is_async")]
    test_cloud_is_async: Option<String>,
    /// Test series name.
    #[arg(long, env = "test_cloud_series")]
    test_cloud_series: Option<String>,
    /// Extra options appended to the submit command, split like a shell would.
    #[arg(long, env = "other_parameters", allow_hyphen_values = true)]
    other_parameters: Option<String>,
}

impl From<InputArgs> for StepInputs {
    fn from(args: InputArgs) -> Self {
        Self {
            work_dir: args.work_dir,
            gemfile: args.gem_file_path,
            ipa_path: args.ipa_path,
            dsym_path: args.dsym_path,
            user: args.xamarin_user,
            api_key: args.test_cloud_api_key,
            devices: args.test_cloud_devices,
            is_async: args.test_cloud_is_async,
            series: args.test_cloud_series,
            custom_options: args.other_parameters,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Install cucumber and test-cloud, then submit (default).
    Run,
    /// Show the strategies and commands a run would use without running them.
    Plan,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.json {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("XTC_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let json_output = cli.json;
    let inputs = StepInputs::from(cli.inputs);

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::run(inputs, json_output),
        Commands::Plan => commands::plan::run(inputs, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
