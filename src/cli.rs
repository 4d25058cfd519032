//! Command-line interface.
//!
//! ```bash
//! # Compare everything below two roots
//! bytedupe scan ~/Pictures /mnt/backup/Pictures
//!
//! # Only JPEGs of at least 100 KiB, four workers, JSON on stdout
//! bytedupe scan ~/Pictures --include-pattern '(?i)\.jpe?g$' --min-size 100KiB --threads 4 -f json
//!
//! # Write a manifest next to the data
//! bytedupe scan /data --output /data/duplicates.ccdup
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Byte-exact duplicate file finder.
///
/// Files are grouped by length and then compared byte by byte, reading each
/// file only as far as needed to tell it apart from its peers. No hashing,
/// no false positives.
#[derive(Debug, Parser)]
#[command(name = "bytedupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress and everything but errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML) to use instead of the platform default
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan directories for duplicate files
    Scan(ScanArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directories to scan (at least one)
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Directory to leave out, with everything below it (repeatable)
    #[arg(long = "exclude-dir", value_name = "DIR")]
    pub exclude_dirs: Vec<PathBuf>,

    /// Only consider files whose name matches this regex (repeatable)
    #[arg(long = "include-pattern", value_name = "REGEX")]
    pub include_patterns: Vec<String>,

    /// Skip files whose name matches this regex (repeatable)
    #[arg(long = "exclude-pattern", value_name = "REGEX")]
    pub exclude_patterns: Vec<String>,

    /// Gitignore-style glob to skip (repeatable)
    #[arg(short, long = "ignore", value_name = "GLOB")]
    pub ignore_patterns: Vec<String>,

    /// Minimum file size to consider (e.g. 4096, 1KiB, 10MB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g. 4096, 1KiB, 10MB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Follow symbolic links during discovery
    #[arg(long, overrides_with = "no_follow_symlinks")]
    pub follow_symlinks: bool,

    /// Do not follow symbolic links, even if the config file says so
    #[arg(long, overrides_with = "follow_symlinks")]
    pub no_follow_symlinks: bool,

    /// Also compare `.ccdup` manifests from earlier runs
    #[arg(long, overrides_with = "no_include_manifests")]
    pub include_manifests: bool,

    /// Skip `.ccdup` manifests, even if the config file includes them
    #[arg(long, overrides_with = "include_manifests")]
    pub no_include_manifests: bool,

    /// Worker threads: 0 = all cores, 1 = sequential (default), N = N workers
    #[arg(short = 't', long, value_name = "N", allow_negative_numbers = true)]
    pub threads: Option<i64>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the report to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Overwrite the --output file if it exists
    #[arg(long, requires = "output")]
    pub force: bool,
}

impl ScanArgs {
    /// Symlink setting from the command line, if either flag was given.
    #[must_use]
    pub fn follow_symlinks_override(&self) -> Option<bool> {
        paired_flag(self.follow_symlinks, self.no_follow_symlinks)
    }

    /// Manifest setting from the command line, if either flag was given.
    #[must_use]
    pub fn include_manifests_override(&self) -> Option<bool> {
        paired_flag(self.include_manifests, self.no_include_manifests)
    }
}

fn paired_flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated duplicate manifest
    #[default]
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size into bytes.
///
/// Decimal (`KB`, `MB`, ...) and binary (`KiB`, `MiB`, ...) units are
/// accepted, case-insensitively; a bare number is bytes.
///
/// ```
/// use bytedupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// ```
///
/// # Errors
///
/// Returns a message if the text is empty or not a size.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    s.parse::<bytesize::ByteSize>()
        .map(|size| size.as_u64())
        .map_err(|e| format!("Invalid size '{s}': {e}"))
}
