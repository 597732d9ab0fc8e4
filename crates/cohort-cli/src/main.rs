#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use cohort_core::ErrorCode;
use cohort_core::config::resolve_config;
use output::{CliError, OutputMode, Reported, render_error, resolve_output_mode};
use std::env;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "cohort",
    author,
    version,
    about = "cohort: find the tickets that ship together",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output (alias for `--format json`).
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Read",
        about = "Detect the implementation group of a ticket",
        long_about = "Discover every ticket connected to a seed through sub-ticket and blocking links, \
                      keep the ones that form its implementation group, and print them in an order \
                      where no ticket precedes one that blocks it.",
        after_help = "EXAMPLES:\n    # Detect the group around ticket 42 using the configured snapshot\n    cohort detect 42\n\n    # Read an explicit tracker snapshot\n    cohort detect 42 --snapshot tracker.json\n\n    # Emit machine-readable output\n    cohort detect 42 --json"
    )]
    Detect(cmd::detect::DetectArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    cohort completions bash\n\n    # Generate zsh completions\n    cohort completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("COHORT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "cohort=debug,info"
        } else {
            "cohort=info,warn"
        })
    });

    let format = env::var("COHORT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let command_result = match cli.command {
        Commands::Detect(ref args) => run_detect(&cli, args).await,
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args, &mut command)
        }
    };

    match command_result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.downcast_ref::<Reported>().is_some() => {
            debug!(error = %err, "command failed");
            ExitCode::FAILURE
        }
        Err(err) => {
            let output = resolve_output_mode(cli.format, None, cli.json);
            let cli_error = CliError::coded(format!("{err:#}"), ErrorCode::InternalUnexpected);
            if render_error(output, &cli_error).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run_detect(cli: &Cli, args: &cmd::detect::DetectArgs) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;

    let config = match resolve_config(&project_root, cli.json) {
        Ok(config) => config,
        Err(err) => {
            let output = resolve_output_mode(cli.format, None, cli.json);
            return Err(output::report(
                output,
                &CliError::coded(format!("{err:#}"), ErrorCode::ConfigParseError),
            ));
        }
    };

    let output = resolve_output_mode(cli.format, Some(&config.resolved_output), cli.json);
    cmd::detect::run_detect(args, output, &config, &project_root).await
}
