//! The result of one scan pass.
//!
//! A [`ScanSession`] owns everything a scan produced: the root, every
//! fingerprinted record, the duplicate groups derived from them and the
//! per-file errors. It lives in memory only; a new scan replaces it.
//!
//! Deletion goes through the session so a selection is always validated
//! against the groups it was made from.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::actions::delete::{self, DeleteConfig, DeletionReport, PlanError};
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::scanner::{Address, FileRecord, ScanError};

/// Transient state of one complete scan.
#[derive(Debug, Clone)]
pub struct ScanSession {
    root: PathBuf,
    scanned_at: DateTime<Utc>,
    records: Vec<FileRecord>,
    groups: Vec<DuplicateGroup>,
    errors: Vec<ScanError>,
    summary: ScanSummary,
}

impl ScanSession {
    /// Assemble a session from the outputs of a scan pass.
    #[must_use]
    pub fn new(
        root: PathBuf,
        records: Vec<FileRecord>,
        groups: Vec<DuplicateGroup>,
        errors: Vec<ScanError>,
        summary: ScanSummary,
    ) -> Self {
        Self {
            root,
            scanned_at: Utc::now(),
            records,
            groups,
            errors,
            summary,
        }
    }

    /// Directory that was scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// When the scan finished.
    #[must_use]
    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    /// Every fingerprinted record, sorted by address.
    #[must_use]
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Duplicate groups in deterministic order.
    #[must_use]
    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    /// Files and archives that could not be processed, sorted by path.
    #[must_use]
    pub fn errors(&self) -> &[ScanError] {
        &self.errors
    }

    /// Scan statistics.
    #[must_use]
    pub fn summary(&self) -> &ScanSummary {
        &self.summary
    }

    /// Whether any group was found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// The group containing `address`, if any.
    #[must_use]
    pub fn group_of(&self, address: &Address) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| g.contains(address))
    }

    /// The record for `address`, if it was fingerprinted.
    #[must_use]
    pub fn record(&self, address: &Address) -> Option<&FileRecord> {
        self.records
            .binary_search_by(|r| r.address.cmp(address))
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// Interpret the text form of an address against this session.
    ///
    /// A plain file whose path contains `::` prints exactly like an archive
    /// member, so a scanned file with that exact path wins; otherwise the
    /// text is parsed with [`Address::parse`].
    #[must_use]
    pub fn resolve(&self, text: &str) -> Address {
        let as_file = Address::file(text);
        if self.record(&as_file).is_some() {
            as_file
        } else {
            Address::parse(text)
        }
    }

    /// Errors as `(address, message)` pairs for display.
    #[must_use]
    pub fn error_listing(&self) -> Vec<(Address, String)> {
        self.errors
            .iter()
            .map(|e| (Address::file(e.path()), e.to_string()))
            .collect()
    }

    /// Validate `addresses` against this session's groups and remove them.
    ///
    /// Call only after the user has confirmed the selection.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] without touching the filesystem if the selection
    /// contains an archive member, an address outside every group, or every
    /// copy of some group.
    pub fn delete_selected(
        &self,
        addresses: impl IntoIterator<Item = Address>,
        config: &DeleteConfig,
    ) -> Result<DeletionReport, PlanError> {
        let request = delete::plan(addresses, &self.groups)?;
        Ok(delete::execute(&request, config))
    }
}
