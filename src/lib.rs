//! bytedupe - byte-exact duplicate file finder
//!
//! Files are bucketed by length, then every bucket with at least two members
//! is compared one byte column at a time. A file stops being read the moment
//! it differs from every other candidate, so unique files usually cost a few
//! bytes of I/O and identical files are proven identical without hashing.
//!
//! The library entry points are [`duplicates::DuplicateFinder`] and the
//! [`scanner::ByteSource`] trait; [`run_app`] drives the command line tool.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::cli::{Cli, Commands, OutputFormat, ScanArgs};
use crate::config::{compile_patterns, Config};
use crate::duplicates::{DuplicateFinder, FinderConfig, ScanResult};
use crate::error::ExitCode;
use crate::output::{JsonOutput, ManifestTarget, ManifestWriter};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::WalkerConfig;
use crate::signal::ShutdownHandler;

/// Run the command line tool and return the process exit code.
///
/// # Errors
///
/// Returns an error for invalid configuration, unusable roots or output
/// paths, and interruption during discovery. Per-file read failures are not
/// errors; they are reported and reflected in the exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    let handler = signal::install_handler().context("Failed to install Ctrl+C handler")?;

    match cli.command {
        Commands::Scan(args) => handle_scan(&args, cli.config.as_deref(), cli.quiet, &handler),
    }
}

fn handle_scan(
    args: &ScanArgs,
    config_path: Option<&Path>,
    quiet: bool,
    handler: &ShutdownHandler,
) -> Result<ExitCode> {
    let config = resolve_config(args, config_path)?;
    let concurrency = config.concurrency()?;

    if let Some(ref output) = args.output {
        check_output_target(output, args.force)?;
    }

    let walker_config = WalkerConfig {
        follow_symlinks: config.follow_symlinks,
        min_size: args.min_size,
        max_size: args.max_size,
        ignore_patterns: config.ignore_patterns.clone(),
        exclude_dirs: args.exclude_dirs.clone(),
        include_patterns: compile_patterns(&config.include_patterns)?,
        exclude_patterns: compile_patterns(&config.exclude_patterns)?,
        include_manifests: config.include_manifests,
    };

    log::info!("Threads: {}", concurrency);
    for root in &args.paths {
        log::debug!("Root: {}", root.display());
    }

    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(quiet));
    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_concurrency(concurrency)
            .with_walker_config(walker_config)
            .with_shutdown_flag(handler.get_flag())
            .with_progress_callback(progress),
    );

    let result = finder
        .find_duplicates(&args.paths)
        .context("Duplicate scan failed")?;

    write_report(&result, args)?;
    log::info!("{}", result.summary.headline());

    Ok(ExitCode::for_result(&result))
}

/// Merge command line flags over the layered configuration.
fn resolve_config(args: &ScanArgs, config_path: Option<&Path>) -> Result<Config> {
    let mut config = Config::load(config_path)?;

    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(follow) = args.follow_symlinks_override() {
        config.follow_symlinks = follow;
    }
    if let Some(include) = args.include_manifests_override() {
        config.include_manifests = include;
    }
    config
        .ignore_patterns
        .extend(args.ignore_patterns.iter().cloned());
    config
        .include_patterns
        .extend(args.include_patterns.iter().cloned());
    config
        .exclude_patterns
        .extend(args.exclude_patterns.iter().cloned());

    config.validate()?;
    Ok(config)
}

/// Refuse to clobber an existing report or write into a missing directory.
fn check_output_target(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "'{}' already exists; pass --force to overwrite it",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            bail!("Output directory does not exist: {}", parent.display());
        }
    }
    Ok(())
}

fn write_report(result: &ScanResult, args: &ScanArgs) -> Result<()> {
    match args.output {
        Some(ref path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_format(result, args.format, ManifestTarget::File, &mut writer)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Report written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            write_format(result, args.format, ManifestTarget::Console, &mut writer)?;
        }
    }
    Ok(())
}

fn write_format<W: Write>(
    result: &ScanResult,
    format: OutputFormat,
    target: ManifestTarget,
    writer: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Text => ManifestWriter::new(result, target).write_to(writer)?,
        OutputFormat::Json => JsonOutput::new(result).write_to(writer)?,
    }
    Ok(())
}
