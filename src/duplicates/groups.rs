//! Duplicate grouping by (size, fingerprint).
//!
//! # Overview
//!
//! [`group_records`] buckets every [`FileRecord`] (plain files and archive
//! members alike) under its `(size, checksum)` key and emits one
//! [`DuplicateGroup`] per key shared by two or more records.
//!
//! Grouping preserves first-encounter order: groups appear in the order their
//! key was first seen, and members keep their input order. Feed it a sorted
//! record set and the output is identical from run to run.
//!
//! # Example
//!
//! ```
//! use arcdupe::duplicates::group_records;
//! use arcdupe::scanner::{FileEntry, FileRecord};
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let now = SystemTime::now();
//! let record = |name: &str, checksum: [u8; 32]| {
//!     FileRecord::from_entry(FileEntry::new(PathBuf::from(name), 5, now), checksum)
//! };
//!
//! let records = vec![
//!     record("/a.txt", [1; 32]),
//!     record("/b.txt", [1; 32]),
//!     record("/c.txt", [2; 32]),
//! ];
//!
//! let (groups, stats) = group_records(records);
//!
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].len(), 2);
//! assert_eq!(stats.eliminated_unique, 1);
//! ```

use std::collections::HashMap;

use crate::scanner::{hash_to_hex, Address, FileRecord, Hash};

/// Records sharing one `(size, checksum)` key, cardinality 2 or more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// BLAKE3 fingerprint shared by every member
    pub hash: Hash,
    /// Size in bytes shared by every member
    pub size: u64,
    /// Members in discovery order
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a group from records already known to share a key.
    #[must_use]
    pub fn new(hash: Hash, size: u64, files: Vec<FileRecord>) -> Self {
        debug_assert!(files.iter().all(|f| f.size == size && f.checksum == hash));
        Self { hash, size, files }
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all members.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size.saturating_mul(self.files.len() as u64)
    }

    /// Space held by redundant copies (all members minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size.saturating_mul(self.duplicate_count() as u64)
    }

    /// Number of redundant copies (members minus one).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Hash as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }

    /// Addresses of the members, in member order.
    #[must_use]
    pub fn addresses(&self) -> Vec<&Address> {
        self.files.iter().map(|f| &f.address).collect()
    }

    /// Whether `address` is a member of this group.
    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.files.iter().any(|f| &f.address == address)
    }
}

/// Statistics from a grouping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Number of records processed
    pub total_records: usize,
    /// Sum of all record sizes in bytes
    pub total_size: u64,
    /// Number of distinct `(size, checksum)` keys
    pub unique_keys: usize,
    /// Records that ended up in a group
    pub records_in_groups: usize,
    /// Records dropped because their key had no other member
    pub eliminated_unique: usize,
    /// Number of groups emitted
    pub duplicate_groups: usize,
    /// Space held by redundant copies across all groups
    pub wasted_space: u64,
}

impl GroupingStats {
    /// Percentage of records dropped as unique.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_records as f64) * 100.0
        }
    }
}

/// Group records by `(size, checksum)`.
///
/// Keys with a single record are dropped. Group order follows the first
/// occurrence of each key; member order follows input order.
#[must_use]
pub fn group_records(
    records: impl IntoIterator<Item = FileRecord>,
) -> (Vec<DuplicateGroup>, GroupingStats) {
    let mut stats = GroupingStats::default();
    let mut index: HashMap<(u64, Hash), usize> = HashMap::new();
    let mut buckets: Vec<(u64, Hash, Vec<FileRecord>)> = Vec::new();

    for record in records {
        stats.total_records += 1;
        stats.total_size = stats.total_size.saturating_add(record.size);

        let key = (record.size, record.checksum);
        match index.get(&key) {
            Some(&slot) => buckets[slot].2.push(record),
            None => {
                index.insert(key, buckets.len());
                buckets.push((record.size, record.checksum, vec![record]));
            }
        }
    }

    stats.unique_keys = buckets.len();

    let groups: Vec<DuplicateGroup> = buckets
        .into_iter()
        .filter_map(|(size, hash, files)| {
            if files.len() < 2 {
                stats.eliminated_unique += files.len();
                return None;
            }
            log::debug!(
                "Duplicate group {}: {} members of {} bytes",
                &hash_to_hex(&hash)[..12],
                files.len(),
                size
            );
            Some(DuplicateGroup::new(hash, size, files))
        })
        .collect();

    stats.duplicate_groups = groups.len();
    stats.records_in_groups = groups.iter().map(DuplicateGroup::len).sum();
    stats.wasted_space = groups
        .iter()
        .map(DuplicateGroup::wasted_space)
        .fold(0, u64::saturating_add);

    log::info!(
        "Grouping complete: {} records → {} groups ({:.1}% unique)",
        stats.total_records,
        stats.duplicate_groups,
        stats.elimination_rate()
    );

    (groups, stats)
}
