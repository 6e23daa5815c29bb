//! Deletion planning and execution.
//!
//! # Overview
//!
//! Deleting duplicates is a two-step affair:
//! 1. [`plan`] validates a selection against the duplicate groups of a scan
//!    and produces a [`DeletionRequest`]. Any violation rejects the whole
//!    selection; nothing is touched.
//! 2. [`execute`] removes every target independently and reports one
//!    [`DeleteOutcome`] per target. A failure never stops its siblings.
//!
//! # Safety
//!
//! - Archive members are never deleted (archives are not rewritten).
//! - Every selected address must belong to a group from the scan.
//! - At least one copy of every group survives.
//! - With [`DeleteConfig::verify_mtime`] set, a file whose size or
//!   modification time changed since the scan is left alone.
//! - Files go to the system trash unless [`DeleteConfig::permanent`] is set.
//!
//! # Example
//!
//! ```no_run
//! use arcdupe::actions::delete::{execute, plan, DeleteConfig};
//! use arcdupe::scanner::Address;
//! use std::path::Path;
//!
//! let session = arcdupe::scan(Path::new("/photos")).unwrap();
//! let request = plan([Address::parse("/photos/copy.jpg")], session.groups()).unwrap();
//! let report = execute(&request, &DeleteConfig::default());
//! println!("{}", report.summary());
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytesize::ByteSize;
use rayon::prelude::*;
use thiserror::Error;

use crate::duplicates::DuplicateGroup;
use crate::scanner::Address;

/// A selection rejected at validation time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The selection names an entry inside an archive.
    #[error("cannot delete archive member {0}: archives are never modified")]
    ArchiveDeletionUnsupported(Address),

    /// The selection names an address that is in no duplicate group.
    #[error("{0} is not a member of any duplicate group")]
    UnknownAddress(Address),

    /// The selection covers every member of a group.
    #[error("selection covers all {members} copies of group {hash}; at least one must be kept")]
    WouldEliminateGroup {
        /// Hex fingerprint of the group
        hash: String,
        /// Number of members in the group
        members: usize,
    },
}

/// Error type for a single removal at execution time.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File was modified since scan.
    #[error("file modified since scan: {0}")]
    Modified(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified(p)
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_stat(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone)]
pub struct DeleteConfig {
    /// Use permanent deletion instead of trash.
    pub permanent: bool,
    /// Refuse to delete files whose size or mtime changed since the scan.
    pub verify_mtime: bool,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            permanent: false,
            verify_mtime: true,
        }
    }
}

impl DeleteConfig {
    /// Create config for trash deletion.
    #[must_use]
    pub fn trash() -> Self {
        Self::default()
    }

    /// Create config for permanent deletion.
    #[must_use]
    pub fn permanent() -> Self {
        Self {
            permanent: true,
            ..Self::default()
        }
    }

    /// Enable/disable the modified-since-scan check.
    #[must_use]
    pub fn with_verify_mtime(mut self, verify: bool) -> Self {
        self.verify_mtime = verify;
        self
    }
}

/// One file scheduled for removal, with its state as recorded by the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionTarget {
    /// Address as selected
    pub address: Address,
    /// Size recorded at scan time
    pub size: u64,
    /// Modification time recorded at scan time
    pub modified: SystemTime,
}

impl DeletionTarget {
    /// Path of the file on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.address.disk_path()
    }
}

/// A validated selection. Only [`plan`] creates these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionRequest {
    targets: Vec<DeletionTarget>,
}

impl DeletionRequest {
    /// Targets in group order, then member order.
    #[must_use]
    pub fn targets(&self) -> &[DeletionTarget] {
        &self.targets
    }

    /// Number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Bytes freed if every removal succeeds.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.targets
            .iter()
            .map(|t| t.size)
            .fold(0, u64::saturating_add)
    }
}

/// Validate `selection` against `groups`.
///
/// Duplicated addresses in the selection are ignored. Each address is
/// checked in sorted order, then each group in group order:
/// 1. archive member → [`PlanError::ArchiveDeletionUnsupported`]
/// 2. in no group → [`PlanError::UnknownAddress`]
/// 3. every member of a group selected → [`PlanError::WouldEliminateGroup`]
///
/// # Errors
///
/// Returns the first violation found. No partial request is ever produced.
pub fn plan(
    selection: impl IntoIterator<Item = Address>,
    groups: &[DuplicateGroup],
) -> Result<DeletionRequest, PlanError> {
    let selected: BTreeSet<Address> = selection.into_iter().collect();

    for address in &selected {
        if address.is_archive_member() {
            log::warn!("Rejecting selection: {address} is inside an archive");
            return Err(PlanError::ArchiveDeletionUnsupported(address.clone()));
        }
        if !groups.iter().any(|g| g.contains(address)) {
            log::warn!("Rejecting selection: {address} is in no duplicate group");
            return Err(PlanError::UnknownAddress(address.clone()));
        }
    }

    let mut targets = Vec::with_capacity(selected.len());
    for group in groups {
        let chosen: Vec<_> = group
            .files
            .iter()
            .filter(|f| selected.contains(&f.address))
            .collect();

        if !chosen.is_empty() && chosen.len() == group.len() {
            log::error!(
                "Rejecting selection: all {} copies of group {} selected",
                group.len(),
                group.hash_hex()
            );
            return Err(PlanError::WouldEliminateGroup {
                hash: group.hash_hex(),
                members: group.len(),
            });
        }

        targets.extend(chosen.into_iter().map(|f| DeletionTarget {
            address: f.address.clone(),
            size: f.size,
            modified: f.modified,
        }));
    }

    log::debug!("Deletion planned: {} files", targets.len());
    Ok(DeletionRequest { targets })
}

/// Result of removing one target.
#[derive(Debug)]
pub struct DeleteOutcome {
    /// Address of the target
    pub address: Address,
    /// Bytes freed on success
    pub result: Result<u64, DeleteError>,
}

impl DeleteOutcome {
    /// Whether the file was removed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-target outcomes of an [`execute`] call, in request order.
#[derive(Debug, Default)]
pub struct DeletionReport {
    /// One outcome per target
    pub outcomes: Vec<DeleteOutcome>,
    /// Whether files were removed permanently rather than trashed
    pub permanent: bool,
}

impl DeletionReport {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(DeleteOutcome::is_success)
    }

    /// Total bytes freed.
    #[must_use]
    pub fn bytes_freed(&self) -> u64 {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .fold(0, |acc, bytes| acc.saturating_add(*bytes))
    }

    /// Failed outcomes only.
    pub fn failures(&self) -> impl Iterator<Item = (&Address, &DeleteError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.address, e)))
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = if self.permanent {
            "Deleted"
        } else {
            "Moved to trash"
        };
        if self.all_succeeded() {
            format!(
                "{} {} file(s), freed {}",
                verb,
                self.success_count(),
                ByteSize::b(self.bytes_freed())
            )
        } else {
            format!(
                "{} {} file(s), {} failed, freed {}",
                verb,
                self.success_count(),
                self.failure_count(),
                ByteSize::b(self.bytes_freed())
            )
        }
    }
}

/// Remove every target of `request`.
///
/// Removals run in parallel and are independent of each other; the report
/// keeps request order.
#[must_use]
pub fn execute(request: &DeletionRequest, config: &DeleteConfig) -> DeletionReport {
    let outcomes: Vec<DeleteOutcome> = request
        .targets
        .par_iter()
        .map(|target| {
            let result = delete_target(target, config);
            if let Err(ref e) = result {
                log::warn!("Failed to delete {}: {}", target.address, e);
            }
            DeleteOutcome {
                address: target.address.clone(),
                result,
            }
        })
        .collect();

    let report = DeletionReport {
        outcomes,
        permanent: config.permanent,
    };
    log::info!("{}", report.summary());
    report
}

/// Remove a single target after checking it against its scan-time state.
///
/// # Errors
///
/// - `Modified` if verification is on and the file changed since the scan
/// - Other errors from [`delete_to_trash`] or [`permanent_delete`]
pub fn delete_target(target: &DeletionTarget, config: &DeleteConfig) -> Result<u64, DeleteError> {
    let path = target.path();

    if config.verify_mtime {
        let metadata = fs::metadata(path).map_err(|e| DeleteError::from_stat(path, e))?;
        let mtime_changed = metadata.modified().is_ok_and(|m| m != target.modified);
        if metadata.len() != target.size || mtime_changed {
            log::warn!(
                "File modified since scan: {} (size {} → {})",
                path.display(),
                target.size,
                metadata.len()
            );
            return Err(DeleteError::Modified(path.to_path_buf()));
        }
    }

    if config.permanent {
        permanent_delete(path)
    } else {
        delete_to_trash(path)
    }
}

/// Move a single file to the system trash. Returns the bytes freed.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if the file cannot be inspected
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<u64, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_stat(path, e))?
        .len();

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);
    Ok(size)
}

/// Permanently delete a single file. Returns the bytes freed.
///
/// **WARNING**: This operation cannot be undone.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `PermanentDeleteFailed` if the delete operation fails otherwise
pub fn permanent_delete(path: &Path) -> Result<u64, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_stat(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| {
        log::error!("Permanent delete failed for {}: {}", path.display(), e);
        match e.kind() {
            io::ErrorKind::NotFound => DeleteError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => DeleteError::PermissionDenied(path.to_path_buf()),
            _ => DeleteError::PermanentDeleteFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        }
    })?;

    log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);
    Ok(size)
}
