//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory tree
//! and collecting file metadata, plus [`fingerprint_entries`] which hashes the
//! collected files on a bounded rayon pool.
//!
//! # Symlinks
//!
//! Symbolic links are skipped, never followed. A link can therefore never
//! introduce a cycle or make the same content appear twice.
//!
//! # Errors
//!
//! Per-file problems (permission denied, file vanished between listing and
//! stat, I/O errors) are yielded as [`ScanError`] values and the walk
//! continues.
//!
//! # Example
//!
//! ```no_run
//! use arcdupe::scanner::{Hasher, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let (records, errors) = walker.walk_records(&Hasher::new(), &pool);
//! println!("{} files fingerprinted, {} errors", records.len(), errors.len());
//! ```

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use jwalk::WalkDir;
use rayon::prelude::*;

use super::{FileEntry, FileRecord, HashError, Hasher, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Directory walker for parallel file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the directory tree, yielding regular files.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Siblings are visited in file-name order.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            match entry_result {
                Ok(entry) => {
                    let path = entry.path();
                    if path == self.root {
                        return None;
                    }

                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        return None;
                    }
                    if file_type.is_symlink() {
                        log::trace!("Skipping symlink: {}", path.display());
                        return None;
                    }

                    match std::fs::symlink_metadata(&path) {
                        Ok(metadata) => self.process_file_entry(path, &metadata),
                        Err(e) => Some(Err(self.handle_io_error(&path, e))),
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    Some(Err(ScanError::from_io(
                        &path,
                        e.into_io_error()
                            .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
                    )))
                }
            }
        })
    }

    /// Walk and fingerprint every regular file under the root.
    ///
    /// Returns the records in traversal order together with every per-file
    /// error met along the way.
    pub fn walk_records(
        &self,
        hasher: &Hasher,
        pool: &rayon::ThreadPool,
    ) -> (Vec<FileRecord>, Vec<ScanError>) {
        let mut entries = Vec::new();
        let mut errors = Vec::new();
        for result in self.walk() {
            match result {
                Ok(entry) => entries.push(entry),
                Err(e) => errors.push(e),
            }
        }

        let (records, hash_errors) = fingerprint_entries(entries, hasher, pool, None);
        errors.extend(hash_errors);
        (records, errors)
    }

    fn process_file_entry(
        &self,
        path: PathBuf,
        metadata: &Metadata,
    ) -> Option<Result<FileEntry, ScanError>> {
        // Sockets, fifos and devices have no stable content
        if !metadata.is_file() {
            log::trace!("Skipping non-regular file: {}", path.display());
            return None;
        }

        let size = metadata.len();
        if !self.config.accepts_size(size) {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                path.display()
            );
            return None;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let created = metadata.created().unwrap_or(modified);

        Some(Ok(FileEntry {
            path,
            size,
            created,
            modified,
        }))
    }

    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => log::warn!("Permission denied: {}", path.display()),
            std::io::ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
            }
            _ => log::warn!("I/O error for {}: {}", path.display(), error),
        }
        ScanError::from_io(path, error)
    }
}

/// Fingerprint walked files on `pool`.
///
/// Output records keep the order of `entries`. Files that fail to hash are
/// reported as [`ScanError::HashError`] and left out of the records; files
/// skipped because of a shutdown request are dropped silently.
pub fn fingerprint_entries(
    entries: Vec<FileEntry>,
    hasher: &Hasher,
    pool: &rayon::ThreadPool,
    progress: Option<&dyn ProgressCallback>,
) -> (Vec<FileRecord>, Vec<ScanError>) {
    let results: Vec<Result<FileRecord, HashError>> = pool.install(|| {
        entries
            .into_par_iter()
            .enumerate()
            .map(|(idx, entry)| {
                if let Some(callback) = progress {
                    callback.on_progress(idx + 1, entry.path.to_string_lossy().as_ref());
                }
                let checksum = hasher.full_hash(&entry.path)?;
                if let Some(callback) = progress {
                    callback.on_item_completed(entry.size);
                }
                Ok(FileRecord::from_entry(entry, checksum))
            })
            .collect()
    });

    let mut records = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(record) => records.push(record),
            Err(e) if e.is_interrupted() => {}
            Err(e) => {
                log::warn!("Failed to hash {}: {}", e.path().display(), e);
                errors.push(ScanError::HashError(e));
            }
        }
    }
    (records, errors)
}
