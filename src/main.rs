//! sweep: bring every git repository under a directory up to date at once
//!
//! Scans the immediate subdirectories of a root for git repositories and runs
//! a bounded number of non-interactive `git pull` (or `git fetch --dry-run`)
//! operations in parallel, each under its own deadline.

use anyhow::Result;
use clap::{Arg, ArgMatches, Command as ClapCommand};
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use repo_sweep::commands::handle_sync_command;
use repo_sweep::core::{
    parse_concurrency, parse_duration, progress_bar, resolve_concurrency, LogWriter, RunConfig,
    CONCURRENCY_ENV, DEFAULT_CONCURRENT_LIMIT, DEFAULT_TASK_TIMEOUT_SECS, LOG_ENV, TIMEOUT_ENV,
};

fn build_cli() -> ClapCommand {
    ClapCommand::new("sweep")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Synchronize every git repository under a directory in parallel")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            ClapCommand::new("sync")
                .about("Pull (or check with --dry-run) every repository under --path")
                .visible_alias("pull")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .value_name("DIR")
                        .help("Root directory whose subdirectories are scanned")
                        .default_value(".")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .help("Only check for upstream changes; never modify a repository")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("verbose")
                        .long("verbose")
                        .alias("v")
                        .help("Show full git output for updates and failures, and debug logs")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("concurrency")
                        .long("concurrency")
                        .short('j')
                        .value_name("N")
                        .env(CONCURRENCY_ENV)
                        .help(format!(
                            "Maximum repositories processed at once (default {DEFAULT_CONCURRENT_LIMIT})"
                        ))
                        .value_parser(parse_concurrency),
                )
                .arg(
                    Arg::new("sequential")
                        .long("sequential")
                        .help("Process one repository at a time")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .value_name("DURATION")
                        .env(TIMEOUT_ENV)
                        .help("Per-repository deadline, e.g. 15s, 2m, 500ms")
                        .default_value("15s")
                        .value_parser(parse_duration),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print one JSON object per repository plus a summary object")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}

/// Logs go to stderr, around the progress bar rather than through it
fn init_logging(verbose: bool, progress: ProgressBar) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,repo_sweep={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(LogWriter::stderr(progress))
        .with_target(false)
        .init();
}

fn run_config(matches: &ArgMatches) -> Result<RunConfig> {
    let path = matches
        .get_one::<PathBuf>("path")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let concurrency = resolve_concurrency(
        matches.get_one::<usize>("concurrency").copied(),
        matches.get_flag("sequential"),
    );
    let timeout = matches
        .get_one::<Duration>("timeout")
        .copied()
        .unwrap_or(Duration::from_secs(DEFAULT_TASK_TIMEOUT_SECS));

    let config = RunConfig::new(
        path,
        matches.get_flag("dry-run"),
        matches.get_flag("verbose"),
        concurrency,
        timeout,
    )?
    .with_json(matches.get_flag("json"));
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("sync", sub_matches)) => {
            let config = run_config(sub_matches)?;
            let progress = progress_bar(config.json)?;
            init_logging(config.verbose, progress.clone());
            handle_sync_command(config, progress).await?;
        }
        _ => build_cli().print_help()?,
    }

    Ok(())
}
