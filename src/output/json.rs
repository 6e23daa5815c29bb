//! JSON output formatter for scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "root": "/data",
//!   "scanned_at": "2024-05-01T12:00:00Z",
//!   "duplicates": [
//!     {
//!       "hash": "abc123...",
//!       "size": 5,
//!       "files": [
//!         { "address": "/data/a.txt", "display_name": "a.txt", "archive_member": false },
//!         { "address": "/data/b.zip::x.txt", "display_name": "x.txt", "archive_member": true }
//!       ]
//!     }
//!   ],
//!   "errors": [
//!     { "address": "/data/bad.zip", "message": "Corrupt archive /data/bad.zip: ..." }
//!   ],
//!   "summary": {
//!     "total_files": 3,
//!     "archive_members": 1,
//!     "archives_scanned": 1,
//!     "total_size": 15,
//!     "duplicate_groups": 1,
//!     "duplicate_files": 1,
//!     "reclaimable_space": 5,
//!     "error_count": 1,
//!     "scan_duration_ms": 12,
//!     "exit_code": 3,
//!     "exit_code_name": "AD003"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;
use crate::scanner::FileRecord;
use crate::session::ScanSession;

/// A single group member in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonMember {
    /// Text form of the address (`archive::entry` for members)
    pub address: String,
    /// Base name for presentation
    pub display_name: String,
    /// Whether the member lives inside an archive
    pub archive_member: bool,
}

impl From<&FileRecord> for JsonMember {
    fn from(record: &FileRecord) -> Self {
        Self {
            address: record.address.to_string(),
            display_name: record.display_name.clone(),
            archive_member: record.address.is_archive_member(),
        }
    }
}

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// BLAKE3 hash as hexadecimal string (64 characters)
    pub hash: String,
    /// Size in bytes shared by every member
    pub size: u64,
    /// Members in group order
    pub files: Vec<JsonMember>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.hash_hex(),
            size: group.size,
            files: group.files.iter().map(JsonMember::from).collect(),
        }
    }
}

/// A file or archive that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct JsonScanError {
    /// Address of the failing file or container
    pub address: String,
    /// Human-readable message
    pub message: String,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
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
    /// Redundant copies across all groups
    pub duplicate_files: usize,
    /// Space held by redundant copies (bytes)
    pub reclaimable_space: u64,
    /// Files and archives that could not be processed
    pub error_count: usize,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "AD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            archive_members: summary.archive_members,
            archives_scanned: summary.archives_scanned,
            total_size: summary.total_size,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            error_count: summary.error_count,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Directory that was scanned
    pub root: String,
    /// RFC 3339 timestamp of the scan
    pub scanned_at: String,
    /// List of duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Files and archives that could not be processed
    pub errors: Vec<JsonScanError>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the JSON view of a session.
    #[must_use]
    pub fn from_session(session: &ScanSession, exit_code: ExitCode) -> Self {
        Self {
            root: session.root().to_string_lossy().into_owned(),
            scanned_at: session.scanned_at().to_rfc3339(),
            duplicates: session
                .groups()
                .iter()
                .map(JsonDuplicateGroup::from)
                .collect(),
            errors: session
                .error_listing()
                .into_iter()
                .map(|(address, message)| JsonScanError {
                    address: address.to_string(),
                    message,
                })
                .collect(),
            summary: JsonSummary::from_scan_summary(session.summary(), exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
