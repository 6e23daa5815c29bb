//! Logging setup for the binary.
//!
//! Everything goes through the `log` facade to an `env_logger` backend on
//! stderr. `RUST_LOG` replaces the computed filter entirely. Without it the
//! CLI flags pick the level for this crate, while dependencies stay at
//! `warn` unless `-vv` is given.
//!
//! ```rust,no_run
//! arcdupe::logging::init_logging(1, false);
//! log::debug!("visible with -v");
//! ```

use std::io::Write;

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Level for this crate's own records.
fn crate_level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Filter directive used when `RUST_LOG` is unset.
fn default_filter(verbose: u8, quiet: bool) -> String {
    let own = crate_level(verbose, quiet);
    let deps = match own {
        LevelFilter::Error => LevelFilter::Error,
        LevelFilter::Trace => LevelFilter::Debug,
        _ => LevelFilter::Warn,
    };
    format!(
        "{},{}={}",
        deps.as_str().to_ascii_lowercase(),
        env!("CARGO_CRATE_NAME"),
        own.as_str().to_ascii_lowercase()
    )
}

/// Install the global logger. Later calls are no-ops.
///
/// With `verbose > 0` each line carries a millisecond timestamp and the
/// emitting module.
pub fn init_logging(verbose: u8, quiet: bool) {
    let filter = default_filter(verbose, quiet);
    let mut builder = Builder::from_env(Env::default().default_filter_or(filter.as_str()));

    if verbose > 0 {
        builder.format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} {}: {}",
                buf.timestamp_millis(),
                record.level(),
                record.module_path().unwrap_or_else(|| record.target()),
                record.args()
            )
        });
    } else {
        builder.format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(buf, "{style}{}{style:#}: {}", record.level(), record.args())
        });
    }

    if builder.try_init().is_ok() {
        log::debug!("Logging initialized (default filter: {filter})");
    }
}
