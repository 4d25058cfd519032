//! Log initialization.
//!
//! `bytedupe` logs through the `log` facade with an `env_logger` backend.
//! `RUST_LOG`, when set, decides the filter; otherwise `-q` limits output to
//! errors and each `-v` raises it one step above info.
//!
//! ```rust,no_run
//! bytedupe::logging::init_logging(1, false);
//! log::debug!("visible with -v");
//! ```

use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Install the global logger.
///
/// Logging is written to stderr so text and JSON reports on stdout stay
/// clean. Calling this twice is harmless; the second call is ignored.
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = std::env::var_os("RUST_LOG").is_some();

    let mut builder = Builder::new();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    let with_target = verbose >= 1;
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        if with_target {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{style}{:<5}{style:#} {}",
                record.level(),
                record.args()
            )
        }
    });

    if builder.try_init().is_ok() {
        log::debug!(
            "Logging initialized at {} ({})",
            log::max_level(),
            if from_env { "RUST_LOG" } else { "flags" }
        );
    }
}

/// Map the `-v`/`-q` flags to a level filter.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}
