//! Scan pipeline orchestration.
//!
//! # Overview
//!
//! [`DuplicateFinder::scan`] runs one complete scan pass:
//! 1. **Walk**: enumerate regular files under the root (single traversal)
//! 2. **Fingerprint**: hash every walked file on a bounded thread pool
//! 3. **Archives**: sniff every walked file and fingerprint ZIP/RAR members
//! 4. **Group**: sort the merged records by address, then bucket by
//!    `(size, checksum)`
//!
//! Per-file and per-archive failures are collected on the resulting
//! [`ScanSession`]. Only an inaccessible root aborts the scan.
//!
//! # Example
//!
//! ```no_run
//! use arcdupe::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let config = FinderConfig::default().with_io_threads(4);
//! let session = DuplicateFinder::new(config).scan(Path::new("/some/path")).unwrap();
//!
//! println!("Found {} duplicate groups", session.groups().len());
//! println!("Reclaimable space: {}", session.summary().reclaimable_display());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use bytesize::ByteSize;

use super::groups::group_records;
use crate::progress::{
    ProgressCallback, PHASE_ARCHIVES, PHASE_FINGERPRINT, PHASE_GROUPING, PHASE_WALKING,
};
use crate::scanner::{
    fingerprint_entries, ArchiveRegistry, Hasher, ScanError, Walker, WalkerConfig,
    DEFAULT_CHUNK_SIZE,
};
use crate::session::ScanSession;

/// Default number of I/O worker threads.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for parallel hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Read buffer size for the fingerprinter.
    pub chunk_size: usize,
    /// Look inside ZIP/RAR containers.
    pub scan_archives: bool,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("chunk_size", &self.chunk_size)
            .field("scan_archives", &self.scan_archives)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            scan_archives: true,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Create a new configuration with custom I/O thread count.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the fingerprinter's read chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Enable or disable archive inspection.
    #[must_use]
    pub fn with_scan_archives(mut self, enabled: bool) -> Self {
        self.scan_archives = enabled;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Plain files fingerprinted
    pub total_files: usize,
    /// Archive members fingerprinted
    pub archive_members: usize,
    /// Containers whose members were read
    pub archives_scanned: usize,
    /// Size of all fingerprinted records in bytes
    pub total_size: u64,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Redundant copies across all groups (members minus one per group)
    pub duplicate_files: usize,
    /// Space held by redundant copies
    pub reclaimable_space: u64,
    /// Files and archives that could not be processed
    pub error_count: usize,
    /// Duration of the entire scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root directory exists but cannot be listed.
    #[error("Access denied: {path}: {source}")]
    AccessDenied {
        /// The root path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O failure on the root path.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The worker pool could not be started.
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Runs scan passes with a fixed configuration.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
    registry: ArchiveRegistry,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new().with_chunk_size(config.chunk_size);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self {
            config,
            hasher,
            registry: ArchiveRegistry::default(),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Replace the archive readers consulted during the archive phase.
    #[must_use]
    pub fn with_registry(mut self, registry: ArchiveRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The finder's configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Run a full scan pass over `root`.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist, is not a directory, or cannot be listed
    /// - The worker pool cannot be created
    /// - The scan is interrupted by shutdown signal
    pub fn scan(&self, root: &Path) -> Result<ScanSession, FinderError> {
        let start_time = Instant::now();
        validate_root(root)?;

        log::info!("Starting duplicate scan of {}", root.display());
        self.check_shutdown()?;

        let scanned_at = SystemTime::now();
        let progress = self.config.progress_callback.as_deref();

        // Walk
        if let Some(callback) = progress {
            callback.on_phase_start(PHASE_WALKING, 0);
        }
        let mut walker = Walker::new(root, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }

        let mut entries = Vec::new();
        let mut errors: Vec<ScanError> = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(entry) => {
                    if let Some(callback) = progress {
                        callback.on_progress(entries.len() + 1, &entry.path.to_string_lossy());
                    }
                    entries.push(entry);
                }
                Err(e) => errors.push(e),
            }
        }
        if let Some(callback) = progress {
            callback.on_phase_end(PHASE_WALKING);
        }
        log::info!("Found {} files", entries.len());
        self.check_shutdown()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()?;

        let archive_candidates = if self.config.scan_archives {
            entries.clone()
        } else {
            Vec::new()
        };

        // Fingerprint
        if let Some(callback) = progress {
            callback.on_phase_start(PHASE_FINGERPRINT, entries.len());
        }
        let (mut records, hash_errors) = fingerprint_entries(entries, &self.hasher, &pool, progress);
        errors.extend(hash_errors);
        if let Some(callback) = progress {
            callback.on_phase_end(PHASE_FINGERPRINT);
        }
        let total_files = records.len();
        self.check_shutdown()?;

        // Archives
        let mut archive_members = 0;
        let mut archives_scanned = 0;
        if self.config.scan_archives {
            if let Some(callback) = progress {
                callback.on_phase_start(PHASE_ARCHIVES, archive_candidates.len());
            }
            let (members, archive_errors) = self.registry.scan_entries(
                &archive_candidates,
                &self.config.walker_config,
                &self.hasher,
                &pool,
                scanned_at,
                progress,
            );
            if let Some(callback) = progress {
                callback.on_phase_end(PHASE_ARCHIVES);
            }
            archive_members = members.len();
            archives_scanned = crate::scanner::archive::containers(&members).len();
            log::info!(
                "Read {} members from {} archives",
                archive_members,
                archives_scanned
            );
            records.extend(members);
            errors.extend(archive_errors);
            self.check_shutdown()?;
        }

        // Group
        if let Some(callback) = progress {
            callback.on_phase_start(PHASE_GROUPING, records.len());
        }
        records.sort_by(|a, b| a.address.cmp(&b.address));
        errors.sort_by(|a, b| a.path().cmp(b.path()));
        let (groups, stats) = group_records(records.iter().cloned());
        if let Some(callback) = progress {
            callback.on_phase_end(PHASE_GROUPING);
        }

        let summary = ScanSummary {
            total_files,
            archive_members,
            archives_scanned,
            total_size: stats.total_size,
            duplicate_groups: groups.len(),
            duplicate_files: groups.iter().map(|g| g.duplicate_count()).sum(),
            reclaimable_space: stats.wasted_space,
            error_count: errors.len(),
            scan_duration: start_time.elapsed(),
        };

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable, {} errors",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.error_count
        );

        Ok(ScanSession::new(
            root.to_path_buf(),
            records,
            groups,
            errors,
            summary,
        ))
    }

    fn check_shutdown(&self) -> Result<(), FinderError> {
        if self.config.is_shutdown_requested() {
            log::info!("Shutdown requested, abandoning scan");
            return Err(FinderError::Interrupted);
        }
        Ok(())
    }
}

/// Check that `root` is a directory this process can list.
fn validate_root(root: &Path) -> Result<(), FinderError> {
    let to_error = |source: std::io::Error| match source.kind() {
        std::io::ErrorKind::NotFound => FinderError::PathNotFound(root.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => FinderError::AccessDenied {
            path: root.to_path_buf(),
            source,
        },
        _ => FinderError::Io {
            path: root.to_path_buf(),
            source,
        },
    };

    let metadata = std::fs::metadata(root).map_err(to_error)?;
    if !metadata.is_dir() {
        return Err(FinderError::NotADirectory(root.to_path_buf()));
    }
    std::fs::read_dir(root).map_err(to_error)?;
    Ok(())
}
