//! BLAKE3 fingerprinter with streaming support.
//!
//! # Overview
//!
//! [`Hasher`] reads its source in fixed-size chunks and feeds each chunk into
//! an incremental BLAKE3 state, so memory use does not depend on file size.
//! The chunk size is purely a buffer size: identical byte sequences produce
//! identical digests whatever chunk size was used.
//!
//! # Example
//!
//! ```no_run
//! use arcdupe::scanner::{hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new().with_chunk_size(4096);
//! let hash = hasher.full_hash(Path::new("photo.jpg")).unwrap();
//! println!("{}", hash_to_hex(&hash));
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::HashError;

/// 256-bit BLAKE3 digest.
pub type Hash = [u8; 32];

/// Default read buffer size (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Streaming content fingerprinter.
#[derive(Debug, Clone)]
pub struct Hasher {
    chunk_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with [`DEFAULT_CHUNK_SIZE`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            shutdown_flag: None,
        }
    }

    /// Set the read chunk size in bytes. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Abort in-flight hashing once `flag` becomes `true`.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Configured chunk size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Fingerprint everything `reader` yields until EOF.
    ///
    /// # Errors
    ///
    /// Propagates the first read error. Reads interrupted by a signal are
    /// retried; a shutdown request yields an [`io::ErrorKind::Interrupted`]
    /// error.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<Hash> {
        let mut state = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            if self.is_shutdown_requested() {
                return Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "shutdown requested",
                ));
            }

            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..read]);
        }

        Ok(*state.finalize().as_bytes())
    }

    /// Fingerprint a file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or a read fails
    /// mid-stream.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let hash = self
            .hash_reader(file)
            .map_err(|e| HashError::from_io(path, e))?;
        log::trace!("Hashed {}", path.display());
        Ok(hash)
    }

    /// Fingerprint bytes already held in memory.
    #[must_use]
    pub fn hash_bytes(&self, bytes: &[u8]) -> Hash {
        *blake3::hash(bytes).as_bytes()
    }
}

/// Convert a hash to a lowercase hexadecimal string.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse a 64-character hexadecimal string into a hash.
///
/// Returns `None` on wrong length or non-hex characters.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Hash> {
    if hex.len() != 64 || !hex.is_ascii() {
        return None;
    }
    let mut hash = [0u8; 32];
    for (i, byte) in hash.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(hash)
}
