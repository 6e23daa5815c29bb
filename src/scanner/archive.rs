//! Archive inspection: format sniffing and in-memory member fingerprinting.
//!
//! # Overview
//!
//! Every regular file found by the walker is sniffed by its leading bytes, not
//! its extension. A file that sniffs as ZIP or RAR is opened with the matching
//! [`ArchiveReader`], its entries are decompressed without touching the disk,
//! and each entry becomes a [`FileRecord`] addressed by
//! `(container path, entry name)`.
//!
//! Scanning is one level deep: an archive stored inside an archive is
//! fingerprinted as an opaque entry and never opened.
//!
//! A container that fails anywhere (bad central directory, truncated entry,
//! CRC mismatch, encrypted entry) contributes no records at all and produces
//! a single [`ScanError::CorruptArchive`].
//!
//! # Adding a format
//!
//! Implement [`ArchiveReader`] and register it with
//! [`ArchiveRegistry::register`]. Nothing downstream of the scanner needs to
//! change.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rayon::prelude::*;
use thiserror::Error;
use zip::ZipArchive;

use super::{
    Address, FileEntry, FileRecord, Hash, HashError, Hasher, ScanError, Walker, WalkerConfig,
};
use crate::progress::ProgressCallback;

/// Number of leading bytes read when sniffing a file.
pub const SNIFF_LEN: usize = 8;

const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_ARCHIVE: &[u8] = b"PK\x05\x06";
const ZIP_SPANNED: &[u8] = b"PK\x07\x08";
const RAR4_SIGNATURE: &[u8] = b"Rar!\x1a\x07\x00";
const RAR5_SIGNATURE: &[u8] = b"Rar!\x1a\x07\x01\x00";

/// Container formats recognised by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// PKWARE ZIP
    Zip,
    /// RAR 4.x or 5.x
    Rar,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zip => write!(f, "zip"),
            Self::Rar => write!(f, "rar"),
        }
    }
}

/// A fingerprinted file entry inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Entry name as stored in the container
    pub name: String,
    /// Declared uncompressed size
    pub size: u64,
    /// Fingerprint of the decompressed bytes
    pub checksum: Hash,
}

/// Failure while reading a container.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The container file could not be opened.
    #[error("cannot open: {0}")]
    Open(#[from] io::Error),

    /// The ZIP reader rejected the container or an entry.
    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),

    /// The RAR decoder rejected the container or an entry.
    #[error("{0}")]
    Rar(String),

    /// An entry failed while being decompressed.
    #[error("entry '{entry}': {source}")]
    Entry {
        /// Name of the failing entry
        entry: String,
        /// Underlying read error
        #[source]
        source: io::Error,
    },
}

impl ArchiveError {
    /// Whether the failure was a shutdown request rather than bad data.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        match self {
            Self::Open(e) | Self::Entry { source: e, .. } => e.kind() == io::ErrorKind::Interrupted,
            Self::Zip(zip::result::ZipError::Io(e)) => e.kind() == io::ErrorKind::Interrupted,
            _ => false,
        }
    }
}

/// A container format the scanner can look inside.
pub trait ArchiveReader: Send + Sync {
    /// Format handled by this reader.
    fn format(&self) -> ArchiveFormat;

    /// Whether `header` (the first [`SNIFF_LEN`] bytes of a file, or fewer
    /// for short files) carries this format's signature.
    fn matches(&self, header: &[u8]) -> bool;

    /// Enumerate and fingerprint every file entry of the container.
    ///
    /// # Errors
    ///
    /// Any failure aborts the whole container; partial member lists are
    /// never returned.
    fn members(&self, path: &Path, hasher: &Hasher) -> Result<Vec<ArchiveMember>, ArchiveError>;
}

/// ZIP reader backed by the `zip` crate.
///
/// Entries are decompressed as a stream straight into the hasher.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipReader;

impl ArchiveReader for ZipReader {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn matches(&self, header: &[u8]) -> bool {
        [ZIP_LOCAL_HEADER, ZIP_EMPTY_ARCHIVE, ZIP_SPANNED]
            .iter()
            .any(|sig| header.starts_with(sig))
    }

    fn members(&self, path: &Path, hasher: &Hasher) -> Result<Vec<ArchiveMember>, ArchiveError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;
        let mut members = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let size = entry.size();
            // The zip reader verifies the CRC once the stream hits EOF
            let checksum = hasher
                .hash_reader(&mut entry)
                .map_err(|source| ArchiveError::Entry {
                    entry: name.clone(),
                    source,
                })?;
            members.push(ArchiveMember {
                name,
                size,
                checksum,
            });
        }

        Ok(members)
    }
}

/// RAR reader backed by the `unrar` crate.
///
/// The decoder hands back whole entries, so each one is held in memory
/// while it is hashed.
#[derive(Debug, Default, Clone, Copy)]
pub struct RarReader;

impl ArchiveReader for RarReader {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Rar
    }

    fn matches(&self, header: &[u8]) -> bool {
        header.starts_with(RAR4_SIGNATURE) || header.starts_with(RAR5_SIGNATURE)
    }

    fn members(&self, path: &Path, hasher: &Hasher) -> Result<Vec<ArchiveMember>, ArchiveError> {
        let rar_err = |e: unrar::error::UnrarError| ArchiveError::Rar(e.to_string());

        let mut archive = unrar::Archive::new(path)
            .open_for_processing()
            .map_err(rar_err)?;
        let mut members = Vec::new();

        while let Some(header) = archive.read_header().map_err(rar_err)? {
            let (name, size, is_file) = {
                let entry = header.entry();
                (
                    entry.filename.to_string_lossy().replace('\\', "/"),
                    entry.unpacked_size,
                    entry.is_file(),
                )
            };

            archive = if is_file {
                let (data, rest) = header.read().map_err(rar_err)?;
                members.push(ArchiveMember {
                    name,
                    size,
                    checksum: hasher.hash_bytes(&data),
                });
                rest
            } else {
                header.skip().map_err(rar_err)?
            };
        }

        Ok(members)
    }
}

/// The set of readers consulted when sniffing a file.
pub struct ArchiveRegistry {
    readers: Vec<Box<dyn ArchiveReader>>,
}

impl fmt::Debug for ArchiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveRegistry")
            .field(
                "formats",
                &self.readers.iter().map(|r| r.format()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for ArchiveRegistry {
    /// Registry with ZIP and RAR support.
    fn default() -> Self {
        Self::empty().register(ZipReader).register(RarReader)
    }
}

impl ArchiveRegistry {
    /// Registry that recognises nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            readers: Vec::new(),
        }
    }

    /// Add a reader. Earlier registrations win when signatures overlap.
    #[must_use]
    pub fn register(mut self, reader: impl ArchiveReader + 'static) -> Self {
        self.readers.push(Box::new(reader));
        self
    }

    /// Formats handled by this registry, in registration order.
    #[must_use]
    pub fn formats(&self) -> Vec<ArchiveFormat> {
        self.readers.iter().map(|r| r.format()).collect()
    }

    /// Reader whose signature matches `header`, if any.
    #[must_use]
    pub fn reader_for(&self, header: &[u8]) -> Option<&dyn ArchiveReader> {
        self.readers
            .iter()
            .find(|r| r.matches(header))
            .map(AsRef::as_ref)
    }

    /// Read the leading bytes of `path` and pick a reader.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be opened or read.
    pub fn sniff(&self, path: &Path) -> io::Result<Option<&dyn ArchiveReader>> {
        let header = read_header(path)?;
        Ok(self.reader_for(&header))
    }

    /// Fingerprint the members of one candidate file.
    ///
    /// Returns `Ok(vec![])` when the file is not a recognised container.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::CorruptArchive`] when the file sniffs as a
    /// container but cannot be read completely, or a plain [`ScanError`]
    /// when the file itself cannot be read.
    pub fn scan_file(
        &self,
        path: &Path,
        hasher: &Hasher,
        scanned_at: SystemTime,
    ) -> Result<Vec<FileRecord>, ScanError> {
        let Some(reader) = self.sniff(path).map_err(|e| ScanError::from_io(path, e))? else {
            return Ok(Vec::new());
        };

        log::debug!("Reading {} archive {}", reader.format(), path.display());

        let members = reader.members(path, hasher).map_err(|e| {
            if e.is_interrupted() {
                return ScanError::HashError(HashError::from_io(
                    path,
                    io::Error::new(io::ErrorKind::Interrupted, e.to_string()),
                ));
            }
            log::warn!("Corrupt {} archive {}: {}", reader.format(), path.display(), e);
            ScanError::CorruptArchive {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        log::debug!("{} members in {}", members.len(), path.display());

        Ok(members
            .into_iter()
            .map(|m| FileRecord::for_member(path, m.name, m.size, m.checksum, scanned_at))
            .collect())
    }

    /// Fingerprint the members of every container among `entries` on `pool`.
    ///
    /// Records come back grouped per archive in the order of `entries`.
    /// Members rejected by `filter` are dropped. Interruptions caused by a
    /// shutdown request are not reported.
    pub fn scan_entries(
        &self,
        entries: &[FileEntry],
        filter: &WalkerConfig,
        hasher: &Hasher,
        pool: &rayon::ThreadPool,
        scanned_at: SystemTime,
        progress: Option<&dyn ProgressCallback>,
    ) -> (Vec<FileRecord>, Vec<ScanError>) {
        let results: Vec<Result<Vec<FileRecord>, ScanError>> = pool.install(|| {
            entries
                .par_iter()
                .enumerate()
                .map(|(idx, entry)| {
                    if let Some(callback) = progress {
                        callback.on_progress(idx + 1, entry.path.to_string_lossy().as_ref());
                    }
                    self.scan_file(&entry.path, hasher, scanned_at)
                })
                .collect()
        });

        let mut records = Vec::new();
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(found) => records.extend(found.into_iter().filter(|r| match &r.address {
                    Address::ArchiveMember { entry, .. } => filter.accepts_member(entry, r.size),
                    Address::File(_) => true,
                })),
                Err(ScanError::HashError(ref e)) if e.is_interrupted() => {}
                Err(e) => errors.push(e),
            }
        }
        (records, errors)
    }
}

/// Read up to [`SNIFF_LEN`] leading bytes of a file.
fn read_header(path: &Path) -> io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut header)?;
    Ok(header)
}

/// Walk `root` and fingerprint the members of every ZIP/RAR container found.
///
/// Only archive-member records are returned; the containers themselves are
/// left to the filesystem walk. Walk errors are reported alongside corrupt
/// archives.
pub fn scan_archives(
    root: &Path,
    config: &WalkerConfig,
    hasher: &Hasher,
    pool: &rayon::ThreadPool,
) -> (Vec<FileRecord>, Vec<ScanError>) {
    let mut entries = Vec::new();
    let mut errors = Vec::new();
    for result in Walker::new(root, config.clone()).walk() {
        match result {
            Ok(entry) => entries.push(entry),
            Err(e) => errors.push(e),
        }
    }

    let (records, archive_errors) = ArchiveRegistry::default().scan_entries(
        &entries,
        config,
        hasher,
        pool,
        SystemTime::now(),
        None,
    );
    errors.extend(archive_errors);
    (records, errors)
}

/// Paths of the containers among `records`, deduplicated, in first-seen order.
#[must_use]
pub fn containers(records: &[FileRecord]) -> Vec<PathBuf> {
    let mut seen = std::collections::HashSet::new();
    records
        .iter()
        .filter(|r| r.address.is_archive_member())
        .map(|r| r.address.disk_path().to_path_buf())
        .filter(|p| seen.insert(p.clone()))
        .collect()
}
