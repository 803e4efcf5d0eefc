//! Subscription engine CLI.

use clap::{ColorChoice, Parser};
use std::io::{self, IsTerminal};
use subs_cli::logging::{LogConfig, LogFormat, init_logging};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{
    run_add, run_check_updates, run_import, run_remove, run_resolve, run_validate,
};
use crate::summary::{print_update_report, print_validation};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("error: failed to start runtime: {error}");
            std::process::exit(1);
        }
    };

    let exit_code = runtime.block_on(dispatch(&cli));
    std::process::exit(exit_code);
}

async fn dispatch(cli: &Cli) -> i32 {
    let result = match &cli.command {
        Command::Resolve(args) => run_resolve(cli, args).await.map(|()| 0),
        Command::CheckUpdates => run_check_updates(cli).await.map(|report| {
            print_update_report(&report);
            if report.failed.is_empty() { 0 } else { 1 }
        }),
        Command::Validate(args) => {
            let (reports, unreadable) = run_validate(args);
            if !reports.is_empty() {
                print_validation(&reports);
            }
            let invalid = reports.iter().filter(|r| !r.is_valid()).count();
            Ok(if invalid + unreadable == 0 { 0 } else { 1 })
        }
        Command::Import(args) => run_import(cli, args).await.map(|()| 0),
        Command::Add(args) => run_add(cli, args).await.map(|()| 0),
        Command::Remove(args) => run_remove(cli, args).await.map(|()| 0),
    };
    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
