//! `define-editor`: scripted edits and checks for Define-XML documents.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use define_cli::commands::{ApplyOptions, run_apply, run_check, run_summary};
use define_cli::logging::{LogConfig, LogFormat, init_logging};
use define_cli::settings::load_settings;
use define_cli::summary::{print_apply_result, print_check_result, print_summary_report};
use tracing::level_filters::LevelFilter;

mod cli;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();
    if let Err(error) = init_logging(&logging(&cli)) {
        eprintln!("error: cannot open log output: {error}");
        return ExitCode::FAILURE;
    }
    match execute(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run the subcommand. `Ok(false)` means `check` found issues.
fn execute(cli: &Cli) -> anyhow::Result<bool> {
    match &cli.command {
        Command::Apply(args) => {
            let settings = load_settings(cli.config.as_deref())?;
            let options = ApplyOptions {
                document: args.document.clone(),
                script: args.script.clone(),
                output: args.output.clone(),
                verify: args.verify,
            };
            print_apply_result(&run_apply(&options, settings.store_config())?);
            Ok(true)
        }
        Command::Check(args) => {
            let result = run_check(&args.document)?;
            print_check_result(&result);
            Ok(result.issues.is_empty())
        }
        Command::Summary(args) => {
            print_summary_report(&run_summary(&args.document)?);
            Ok(true)
        }
    }
}

/// `--log-level` wins over `-v`/`-q`; `RUST_LOG` applies only when neither
/// was given.
fn logging(cli: &Cli) -> LogConfig {
    let level_filter = match cli.log_level {
        Some(LogLevelArg::Error) => LevelFilter::ERROR,
        Some(LogLevelArg::Warn) => LevelFilter::WARN,
        Some(LogLevelArg::Info) => LevelFilter::INFO,
        Some(LogLevelArg::Debug) => LevelFilter::DEBUG,
        Some(LogLevelArg::Trace) => LevelFilter::TRACE,
        None => cli.verbosity.tracing_level_filter(),
    };
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    LogConfig {
        level_filter,
        use_env_filter: cli.log_level.is_none() && !cli.verbosity.is_present(),
        with_ansi,
        format,
        log_file: cli.log_file.clone(),
    }
}
