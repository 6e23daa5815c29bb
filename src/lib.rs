//! ArcDupe - duplicate file finder that looks inside archives.
//!
//! A scan walks a directory tree, fingerprints every regular file with
//! BLAKE3, reads the members of ZIP and RAR containers, and groups
//! everything that shares a size and checksum. Plain-file copies can then
//! be deleted; archive members are reported but never modified.
//!
//! ```no_run
//! use std::path::Path;
//! use arcdupe::actions::DeleteConfig;
//! use arcdupe::scanner::Address;
//!
//! let session = arcdupe::scan(Path::new("/data")).unwrap();
//! for group in session.groups() {
//!     println!("{} copies of {} bytes", group.len(), group.size);
//! }
//! let report = arcdupe::delete_selected(
//!     [Address::parse("/data/copy.txt")],
//!     &session,
//!     &DeleteConfig::trash(),
//! );
//! ```

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod session;
pub mod signal;

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use bytesize::ByteSize;

use crate::actions::{DeleteConfig, DeletionReport, PlanError};
use crate::cli::{Cli, Commands, DeleteArgs, OutputFormat, ScanArgs, ScanOptions};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use crate::error::ExitCode;
use crate::output::{write_report, JsonOutput, TextOutput};
use crate::progress::Progress;
use crate::scanner::{Address, WalkerConfig};
use crate::session::ScanSession;
use crate::signal::ShutdownHandler;

/// Scan `root` with default settings.
///
/// # Errors
///
/// Returns [`FinderError`] if the root cannot be scanned at all. Problems
/// with individual files and archives are collected in the session instead.
pub fn scan(root: &Path) -> Result<ScanSession, FinderError> {
    DuplicateFinder::with_defaults().scan(root)
}

/// Remove the selected plain-file copies found by `session`.
///
/// # Errors
///
/// Returns [`PlanError`] without touching the filesystem if the selection
/// is rejected.
pub fn delete_selected(
    addresses: impl IntoIterator<Item = Address>,
    session: &ScanSession,
    config: &DeleteConfig,
) -> Result<DeletionReport, PlanError> {
    session.delete_selected(addresses, config)
}

/// Run the command line application.
///
/// # Errors
///
/// Returns an error for fatal failures: an unusable root, a rejected
/// selection, an interrupted scan, or an unwritable stdout.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let shutdown = match signal::install_handler() {
        Ok(handler) => handler,
        Err(e) => {
            log::warn!("{e}; Ctrl+C will terminate immediately");
            ShutdownHandler::new()
        }
    };
    let config = Config::load();

    match cli.command {
        Commands::Scan(args) => run_scan(&args, &config, &shutdown, cli.quiet),
        Commands::Delete(args) => run_delete(&args, &config, &shutdown, cli.quiet),
    }
}

/// Merge CLI flags over config-file values over built-in defaults.
fn finder_config(
    options: &ScanOptions,
    config: &Config,
    shutdown: &ShutdownHandler,
    show_progress: bool,
) -> FinderConfig {
    let mut finder = FinderConfig::default()
        .with_walker_config(WalkerConfig::new(
            options.skip_hidden,
            options.skip_empty,
            options.min_size,
            options.max_size,
        ))
        .with_shutdown_flag(shutdown.get_flag());

    if let Some(threads) = options.io_threads.or(config.io_threads) {
        finder = finder.with_io_threads(threads);
    }
    if let Some(chunk_size) = options.chunk_size.or(config.chunk_size) {
        finder = finder.with_chunk_size(chunk_size);
    }
    let scan_archives = !options.no_archives && config.scan_archives.unwrap_or(true);
    finder = finder.with_scan_archives(scan_archives);

    if show_progress {
        finder = finder.with_progress_callback(Arc::new(Progress::new(false)));
    }
    finder
}

fn scan_exit_code(session: &ScanSession) -> ExitCode {
    if !session.errors().is_empty() {
        ExitCode::PartialSuccess
    } else if session.has_duplicates() {
        ExitCode::Success
    } else {
        ExitCode::NoDuplicates
    }
}

fn run_scan(
    args: &ScanArgs,
    config: &Config,
    shutdown: &ShutdownHandler,
    quiet: bool,
) -> Result<ExitCode> {
    let show_progress = !quiet && args.output == OutputFormat::Text;
    let finder = DuplicateFinder::new(finder_config(&args.scan, config, shutdown, show_progress));
    let session = finder.scan(&args.scan.path)?;
    let exit_code = scan_exit_code(&session);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => TextOutput::new(&session)
            .write_to(&mut out)
            .context("Failed to write scan results")?,
        OutputFormat::Json => JsonOutput::from_session(&session, exit_code)
            .write_to(&mut out, true)
            .context("Failed to write scan results")?,
    }
    out.flush()?;

    Ok(exit_code)
}

fn run_delete(
    args: &DeleteArgs,
    config: &Config,
    shutdown: &ShutdownHandler,
    quiet: bool,
) -> Result<ExitCode> {
    let finder = DuplicateFinder::new(finder_config(&args.scan, config, shutdown, !quiet));
    let session = finder.scan(&args.scan.path)?;

    let selection = args.select.iter().map(|text| session.resolve(text));
    let request = actions::plan(selection, session.groups())
        .context("Selection rejected")?;
    let delete_config = if args.permanent {
        DeleteConfig::permanent()
    } else {
        DeleteConfig::trash()
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let verb = if args.permanent {
        "Permanently delete"
    } else {
        "Move to trash"
    };
    writeln!(out, "{verb} {} file(s), {}:", request.len(), ByteSize::b(request.total_bytes()))?;
    for target in request.targets() {
        writeln!(out, "  {}", target.address)?;
    }
    out.flush()?;

    if !args.yes && !confirm(&mut io::stdin().lock(), &mut io::stderr())? {
        writeln!(out, "Aborted; nothing was deleted")?;
        return Ok(ExitCode::Success);
    }

    let report = actions::execute(&request, &delete_config);
    write_report(&report, &mut out).context("Failed to write deletion report")?;
    out.flush()?;

    if report.all_succeeded() {
        Ok(ExitCode::Success)
    } else {
        Ok(ExitCode::PartialSuccess)
    }
}

/// Ask on `prompt` and read a yes/no answer from `input`. Anything other
/// than `y` or `yes` declines.
fn confirm<R: BufRead, W: Write>(input: &mut R, prompt: &mut W) -> io::Result<bool> {
    write!(prompt, "Proceed? [y/N] ")?;
    prompt.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
