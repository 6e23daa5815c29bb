//! Progress reporting using indicatif.
//!
//! The scan pipeline reports through [`ProgressCallback`]; [`Progress`] turns
//! those calls into terminal progress bars on stderr. Phase names are the
//! `PHASE_*` constants below.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Directory traversal. Total is unknown and reported as 0.
pub const PHASE_WALKING: &str = "walking";
/// Fingerprinting plain files.
pub const PHASE_FINGERPRINT: &str = "fingerprint";
/// Looking inside candidate archives.
pub const PHASE_ARCHIVES: &str = "archives";
/// Bucketing records by fingerprint.
pub const PHASE_GROUPING: &str = "grouping";

/// Progress callback for the phases of a scan.
///
/// Implementations must be thread-safe: `on_progress` is called from the
/// worker pool.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (one of the `PHASE_*` constants)
    /// * `total` - Total number of items to process, 0 when unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based, not necessarily monotonic)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when an item has been processed, with its size in bytes.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Free-form status line.
    fn on_message(&self, _message: &str) {}
}

/// Terminal progress reporter.
pub struct Progress {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
    active: Mutex<Option<String>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// With `quiet` set nothing is drawn.
    ///
    /// ```
    /// use arcdupe::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        Self {
            multi,
            bars: Mutex::new(HashMap::new()),
            active: Mutex::new(None),
            quiet,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn label(phase: &str) -> &'static str {
        match phase {
            PHASE_WALKING => "Walking directory",
            PHASE_FINGERPRINT => "Fingerprinting",
            PHASE_ARCHIVES => "Reading archives",
            PHASE_GROUPING => "Grouping",
            _ => "Working",
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = if total == 0 {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::bar_style());
            pb
        };
        pb.set_message(Self::label(phase));

        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(phase.to_string(), pb);
        }
        if let Ok(mut active) = self.active.lock() {
            *active = Some(phase.to_string());
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        let Ok(active) = self.active.lock() else {
            return;
        };
        let Some(phase) = active.as_deref() else {
            return;
        };
        if let Ok(bars) = self.bars.lock() {
            if let Some(pb) = bars.get(phase) {
                if pb.length().is_some() {
                    pb.inc(1);
                } else {
                    pb.set_position(current as u64);
                }
                pb.set_message(truncate_path(path, 30));
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        if let Ok(mut bars) = self.bars.lock() {
            if let Some(pb) = bars.remove(phase) {
                pb.finish_with_message(format!("{} complete", Self::label(phase)));
            }
        }
        if let Ok(mut active) = self.active.lock() {
            if active.as_deref() == Some(phase) {
                *active = None;
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        // A hidden target swallows this when stderr is not a terminal
        let _ = self.multi.println(message);
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
