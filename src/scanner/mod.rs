//! Scanner module for directory traversal, archive inspection and hashing.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Streaming content fingerprints with BLAKE3
//! - Enumerating and fingerprinting ZIP/RAR archive members in memory
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file fingerprinting
//! - [`hasher`]: BLAKE3 fingerprinter (fixed-size chunks)
//! - [`archive`]: Format sniffing and per-format [`archive::ArchiveReader`]s
//!
//! # Example
//!
//! ```no_run
//! use arcdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod archive;
pub mod hasher;
pub mod walker;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

pub use archive::{scan_archives, ArchiveFormat, ArchiveReader, ArchiveRegistry};
pub use hasher::{hash_to_hex, hex_to_hash, Hash, Hasher, DEFAULT_CHUNK_SIZE};
pub use walker::{fingerprint_entries, Walker};

/// Separator between the container path and the entry name in the
/// text form of an archive member address.
pub const MEMBER_SEPARATOR: &str = "::";

/// Locator for one unit of content.
///
/// Plain files are addressed by path. Archive members are addressed by the
/// container path plus the entry name, so two archives holding entries with
/// the same inner name never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Address {
    /// A standalone file on disk.
    File(PathBuf),
    /// An entry inside a ZIP or RAR container.
    ArchiveMember {
        /// Path of the container file
        archive: PathBuf,
        /// Entry name as stored in the container
        entry: String,
    },
}

impl Address {
    /// Address of a standalone file.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Address of an archive member.
    #[must_use]
    pub fn member(archive: impl Into<PathBuf>, entry: impl Into<String>) -> Self {
        Self::ArchiveMember {
            archive: archive.into(),
            entry: entry.into(),
        }
    }

    /// Parse the text form produced by [`fmt::Display`].
    ///
    /// Anything containing [`MEMBER_SEPARATOR`] is an archive member; the
    /// split happens at the first occurrence. A plain file whose name
    /// contains the separator reads back as a member here; use
    /// `ScanSession::resolve` to interpret text against scanned records.
    ///
    /// ```
    /// use arcdupe::scanner::Address;
    ///
    /// assert_eq!(Address::parse("/tmp/a.txt"), Address::file("/tmp/a.txt"));
    /// assert_eq!(
    ///     Address::parse("/tmp/b.zip::docs/a.txt"),
    ///     Address::member("/tmp/b.zip", "docs/a.txt")
    /// );
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text.split_once(MEMBER_SEPARATOR) {
            Some((archive, entry)) if !archive.is_empty() && !entry.is_empty() => {
                Self::member(archive, entry)
            }
            _ => Self::file(text),
        }
    }

    /// Whether this address points inside an archive.
    #[must_use]
    pub fn is_archive_member(&self) -> bool {
        matches!(self, Self::ArchiveMember { .. })
    }

    /// The on-disk path backing this address (the container for members).
    #[must_use]
    pub fn disk_path(&self) -> &Path {
        match self {
            Self::File(path) => path,
            Self::ArchiveMember { archive, .. } => archive,
        }
    }

    /// Base name used for presentation.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
            Self::ArchiveMember { entry, .. } => entry
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(entry.as_str())
                .to_string(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::ArchiveMember { archive, entry } => {
                write!(f, "{}{}{}", archive.display(), MEMBER_SEPARATOR, entry)
            }
        }
    }
}

/// Metadata for a file discovered by the [`Walker`], before fingerprinting.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Creation time (falls back to the modification time where unsupported)
    pub created: SystemTime,
    /// Last modification time
    pub modified: SystemTime,
}

impl FileEntry {
    /// Create a new FileEntry with `created == modified`.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            created: modified,
            modified,
        }
    }
}

/// One fingerprinted unit of content: a plain file or an archive member.
///
/// Records are created during a scan pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Where the content lives
    pub address: Address,
    /// Base name for presentation
    pub display_name: String,
    /// Declared size (filesystem stat or archive entry header)
    pub size: u64,
    /// BLAKE3 content fingerprint
    pub checksum: Hash,
    /// Creation time; scan time for archive members
    pub created: SystemTime,
    /// Modification time; scan time for archive members
    pub modified: SystemTime,
}

impl FileRecord {
    /// Build a record for a plain file from its walker entry and checksum.
    #[must_use]
    pub fn from_entry(entry: FileEntry, checksum: Hash) -> Self {
        let address = Address::File(entry.path);
        Self {
            display_name: address.display_name(),
            address,
            size: entry.size,
            checksum,
            created: entry.created,
            modified: entry.modified,
        }
    }

    /// Build a record for an archive member. Both timestamps are `scanned_at`.
    #[must_use]
    pub fn for_member(
        archive: &Path,
        entry: String,
        size: u64,
        checksum: Hash,
        scanned_at: SystemTime,
    ) -> Self {
        let address = Address::member(archive, entry);
        Self {
            display_name: address.display_name(),
            address,
            size,
            checksum,
            created: scanned_at,
            modified: scanned_at,
        }
    }

    /// Checksum as hexadecimal string.
    #[must_use]
    pub fn checksum_hex(&self) -> String {
        hash_to_hex(&self.checksum)
    }
}

/// Configuration for directory walking.
///
/// Symbolic links are never followed; see [`Walker`].
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Skip zero-length files. Off by default: empty files are
    /// duplicates of each other like any other content.
    pub skip_empty: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,
}

impl WalkerConfig {
    /// Create a new configuration from CLI arguments.
    #[must_use]
    pub fn new(
        skip_hidden: bool,
        skip_empty: bool,
        min_size: Option<u64>,
        max_size: Option<u64>,
    ) -> Self {
        Self {
            skip_hidden,
            skip_empty,
            min_size,
            max_size,
        }
    }

    /// Whether a file of `size` bytes passes the empty and size filters.
    #[must_use]
    pub fn accepts_size(&self, size: u64) -> bool {
        if size == 0 && self.skip_empty {
            return false;
        }
        if self.min_size.is_some_and(|min| size < min) {
            return false;
        }
        !self.max_size.is_some_and(|max| size > max)
    }

    /// Whether an archive member passes the filters.
    ///
    /// With `skip_hidden`, a member is hidden when any component of its
    /// entry name starts with `.`.
    #[must_use]
    pub fn accepts_member(&self, entry: &str, size: u64) -> bool {
        if self.skip_hidden && entry.split('/').any(|part| part.starts_with('.')) {
            return false;
        }
        self.accepts_size(size)
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug, Clone)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl HashError {
    /// Classify an I/O error raised while fingerprinting `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: Arc::new(error),
            },
        }
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }

    /// Whether this failure came from a shutdown request rather than the file.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::Interrupted)
    }
}

/// Non-fatal problems recorded while scanning.
///
/// These are attached to the session; they never abort a scan.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The file disappeared between listing and reading.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Fingerprinting the file failed mid-stream.
    #[error(transparent)]
    HashError(#[from] HashError),

    /// A sniffed archive could not be opened or fully read.
    #[error("Corrupt archive {path}: {reason}")]
    CorruptArchive {
        /// Path of the container
        path: PathBuf,
        /// What went wrong
        reason: String,
    },
}

impl ScanError {
    /// Classify an I/O error raised while stat-ing `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: Arc::new(error),
            },
        }
    }

    /// Path of the file or archive the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p)
            | Self::NotFound(p)
            | Self::Io { path: p, .. }
            | Self::CorruptArchive { path: p, .. } => p,
            Self::HashError(e) => e.path(),
        }
    }
}
