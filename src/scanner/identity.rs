//! Physical file identity.
//!
//! Two directory entries can name the same file: a hardlink, a symlink that is
//! followed during the walk, or overlapping include roots. Such entries share
//! their content trivially and must be counted once.
//!
//! # Platform Support
//!
//! - **Unix**: `(device, inode)` from the file metadata
//! - **Other**: the canonical path, which resolves symlinks but not hardlinks

use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Key identifying the file behind a directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileIdentity {
    /// Device and inode number.
    Inode {
        /// Device id
        device: u64,
        /// Inode number on that device
        inode: u64,
    },
    /// Canonical path, where no inode is available.
    Path(PathBuf),
}

impl FileIdentity {
    /// Identity of `path`, given metadata that followed any symlinks.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(_path: &Path, metadata: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self::Inode {
            device: metadata.dev(),
            inode: metadata.ino(),
        }
    }

    /// Identity of `path`, given metadata that followed any symlinks.
    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(path: &Path, _metadata: &Metadata) -> Self {
        Self::Path(
            path.canonicalize()
                .unwrap_or_else(|_| path.to_path_buf()),
        )
    }
}
