//! Incremental block hashing of a single file.
//!
//! # Overview
//!
//! A [`ChunkHasher`] owns the read state of one candidate file. Each call to
//! [`ChunkHasher::next_chunk`] reads the next block of at most
//! [`HashSettings::block_size`] bytes and returns its digest, so files are
//! only read as far as it takes to tell them apart.
//!
//! The file handle is opened lazily on the first read and closed as soon as
//! the file is exhausted. Dropping the hasher closes it on every other path,
//! including when the file is split away from its group.
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::scanner::{ChunkHasher, Checksum, HashSettings};
//! use std::path::PathBuf;
//!
//! let settings = HashSettings::new(4096, Checksum::Md5).unwrap();
//! let mut hasher = ChunkHasher::new(PathBuf::from("/tmp/file.bin"), 10_000, settings);
//! while !hasher.is_finished() {
//!     let digest = hasher.next_chunk().unwrap();
//!     println!("{} @ {}", digest, hasher.position());
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use super::checksum::{Checksum, Digest};
use super::HashError;
use crate::config::ConfigError;

/// Default block size in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 10;

/// Block size and checksum shared by every hasher of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashSettings {
    block_size: NonZeroUsize,
    checksum: Checksum,
}

impl HashSettings {
    /// Create hash settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBlockSize`] if `block_size` is zero.
    pub fn new(block_size: usize, checksum: Checksum) -> Result<Self, ConfigError> {
        let block_size = NonZeroUsize::new(block_size).ok_or(ConfigError::InvalidBlockSize)?;
        Ok(Self {
            block_size,
            checksum,
        })
    }

    /// Number of bytes read per block.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size.get()
    }

    /// Checksum family used for every block.
    #[must_use]
    pub fn checksum(&self) -> Checksum {
        self.checksum
    }
}

impl Default for HashSettings {
    fn default() -> Self {
        Self {
            block_size: NonZeroUsize::new(DEFAULT_BLOCK_SIZE).unwrap_or(NonZeroUsize::MIN),
            checksum: Checksum::default(),
        }
    }
}

/// Sequential block reader and hasher for one file.
#[derive(Debug)]
pub struct ChunkHasher {
    path: PathBuf,
    size: u64,
    position: u64,
    last: Option<Digest>,
    reader: Option<BufReader<File>>,
    /// Block buffer reused across calls, released once the file is finished
    buffer: Vec<u8>,
    settings: HashSettings,
}

impl ChunkHasher {
    /// Create a hasher for `path`, whose size was recorded at discovery.
    ///
    /// No I/O happens until the first call to [`next_chunk`](Self::next_chunk).
    #[must_use]
    pub fn new(path: PathBuf, size: u64, settings: HashSettings) -> Self {
        Self {
            path,
            size,
            position: 0,
            last: None,
            reader: None,
            buffer: Vec::new(),
            settings,
        }
    }

    /// Path of the file being hashed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size recorded when the file was discovered.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Digest of the most recently read block, if any.
    #[must_use]
    pub fn last_digest(&self) -> Option<Digest> {
        self.last
    }

    /// Whether the whole file has been consumed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.position >= self.size
    }

    /// Whether a file handle is currently held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Read and digest the next block.
    ///
    /// The final block of a file may be shorter than the block size; it is
    /// digested over the bytes available. Once the file is exhausted the
    /// cached digest is returned without touching the file again. A file that
    /// is empty digests as the empty block.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read, or if it
    /// ends before its recorded size.
    pub fn next_chunk(&mut self) -> Result<Digest, HashError> {
        if self.is_finished() {
            let checksum = self.settings.checksum;
            return Ok(*self.last.get_or_insert_with(|| checksum.digest(&[])));
        }

        let remaining = self.size - self.position;
        let block_size = self.settings.block_size();
        let wanted = usize::try_from(remaining).map_or(block_size, |r| r.min(block_size));

        let mut reader = match self.reader.take() {
            Some(reader) => reader,
            None => open_reader(&self.path)?,
        };

        self.buffer.resize(wanted, 0);
        reader
            .read_exact(&mut self.buffer)
            .map_err(|e| HashError::from_read(&self.path, self.position, e))?;

        self.position += wanted as u64;
        let digest = self.settings.checksum.digest(&self.buffer);
        self.last = Some(digest);

        if self.is_finished() {
            log::trace!("Finished reading {}", self.path.display());
            self.buffer = Vec::new();
        } else {
            self.reader = Some(reader);
        }

        Ok(digest)
    }
}

fn open_reader(path: &Path) -> Result<BufReader<File>, HashError> {
    log::trace!("Opening {}", path.display());
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| HashError::from_open(path, e))
}
