//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Grouping fingerprinted records by `(size, checksum)`
//! - Orchestrating a complete scan pass ([`DuplicateFinder`])

pub mod finder;
pub mod groups;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary, DEFAULT_IO_THREADS};
pub use groups::{group_records, DuplicateGroup, GroupingStats};
