//! Scanner module for directory traversal and block hashing.
//!
//! This module provides functionality for:
//! - Directory walking with depth limits, excluded subtrees and name filters
//! - Block checksums (CRC-32 and MD5)
//! - Incremental per-file block hashing
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`checksum`]: Block checksum families
//! - [`chunk`]: Sequential block reader for one file
//! - [`identity`]: Physical file identity for counting each file once
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     max_depth: 2,
//!     min_size: 1024,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```

pub mod checksum;
pub mod chunk;
pub mod identity;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};

// Re-export main types
pub use checksum::{Checksum, Digest, UnknownChecksum};
pub use chunk::{ChunkHasher, HashSettings, DEFAULT_BLOCK_SIZE};
pub use identity::FileIdentity;
pub use walker::Walker;

/// A file discovered by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes at discovery time
    pub size: u64,
    /// Physical identity, when the walker captured it
    pub identity: Option<FileIdentity>,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            identity: None,
        }
    }

    /// Attach the physical identity of the file.
    #[must_use]
    pub fn with_identity(mut self, identity: FileIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Key under which the file is counted once.
    ///
    /// Falls back to the path when no identity was captured.
    #[must_use]
    pub fn identity(&self) -> FileIdentity {
        self.identity
            .clone()
            .unwrap_or_else(|| FileIdentity::Path(self.path.clone()))
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Levels of subdirectories to descend into (0 = root directory only).
    pub max_depth: usize,

    /// Minimum file size to include (in bytes).
    pub min_size: u64,

    /// Case-insensitive glob matched against the file name.
    /// `None` matches every file.
    pub name_filter: Option<glob::Pattern>,

    /// Directories whose whole subtree is skipped.
    pub exclude_dirs: Vec<PathBuf>,

    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_depth: 0,
            min_size: 1,
            name_filter: None,
            exclude_dirs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

impl WalkerConfig {
    /// Set the recursion depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set the file name filter.
    #[must_use]
    pub fn with_name_filter(mut self, pattern: Option<glob::Pattern>) -> Self {
        self.name_filter = pattern;
        self
    }

    /// Set the excluded directories.
    #[must_use]
    pub fn with_exclude_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.exclude_dirs = dirs;
        self
    }

    /// Follow symbolic links.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised while accessing `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur during block hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The file ended before its recorded size.
    #[error("File changed during scan (ended early at byte {position}): {path}")]
    Truncated {
        /// Path of the file
        path: PathBuf,
        /// Offset of the block that could not be read in full
        position: u64,
    },

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    pub(crate) fn from_open(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    pub(crate) fn from_read(path: &Path, position: u64, error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated {
                path: path.to_path_buf(),
                position,
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source: error,
            }
        }
    }
}
