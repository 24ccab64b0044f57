//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing one include root
//! and yielding the candidate files for duplicate detection.
//!
//! # Features
//!
//! - Recursion depth limit (0 = files directly in the root only)
//! - Excluded directories prune their whole subtree
//! - Minimum size filter
//! - Case-insensitive glob filter on the file name
//! - Optional symlink following
//! - Deterministic order (children sorted by file name)
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig::default().with_max_depth(1);
//! let walker = Walker::new(Path::new("/home/user/Downloads"), config);
//! let files: Vec<_> = walker.walk().collect::<Result<_, _>>().unwrap();
//! println!("{} candidates", files.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glob::MatchOptions;
use walkdir::{DirEntry, WalkDir};

use super::{FileEntry, FileIdentity, ScanError, WalkerConfig};

const NAME_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Directory walker for file discovery under one root.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Check a file name against the configured filter.
    #[must_use]
    pub fn matches_name(&self, path: &Path) -> bool {
        let Some(pattern) = &self.config.name_filter else {
            return true;
        };
        path.file_name()
            .is_some_and(|name| pattern.matches_with(&name.to_string_lossy(), NAME_MATCH_OPTIONS))
    }

    /// Excluded directories in canonical form where they exist.
    fn excluded_dirs(&self) -> Vec<PathBuf> {
        self.config
            .exclude_dirs
            .iter()
            .map(|dir| dir.canonicalize().unwrap_or_else(|_| dir.clone()))
            .collect()
    }

    /// Walk the directory tree, yielding candidate files.
    ///
    /// Paths are absolute: the root is canonicalised before walking. Errors
    /// are yielded as [`ScanError`] values; callers decide whether to stop.
    pub fn walk(&self) -> Box<dyn Iterator<Item = Result<FileEntry, ScanError>> + '_> {
        let root = match self.root.canonicalize() {
            Ok(root) => root,
            Err(e) => {
                return Box::new(std::iter::once(Err(ScanError::from_io(&self.root, e))));
            }
        };

        let excluded = self.excluded_dirs();
        if excluded.iter().any(|dir| root.starts_with(dir)) {
            log::debug!("Root {} is under an excluded directory", root.display());
            return Box::new(std::iter::empty());
        }
        log::debug!(
            "Walking {} (depth {}, {} excluded)",
            root.display(),
            self.config.max_depth,
            excluded.len()
        );

        let entries = WalkDir::new(&root)
            .min_depth(1)
            .max_depth(self.config.max_depth.saturating_add(1))
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !is_excluded(entry, &excluded));

        Box::new(entries.filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            match entry_result {
                Ok(entry) => self.process_entry(&entry),
                Err(e) => Some(Err(convert_walk_error(&root, e))),
            }
        }))
    }

    /// Apply the file filters to one entry.
    fn process_entry(&self, entry: &DirEntry) -> Option<Result<FileEntry, ScanError>> {
        if !entry.file_type().is_file() {
            if entry.file_type().is_symlink() {
                log::trace!("Skipping symlink: {}", entry.path().display());
            }
            return None;
        }

        let path = entry.path();
        if !self.matches_name(path) {
            log::trace!("Skipping file due to name filter: {}", path.display());
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => return Some(Err(convert_walk_error(path, e))),
        };
        let size = metadata.len();

        if size < self.config.min_size {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                path.display()
            );
            return None;
        }

        Some(Ok(FileEntry::new(path.to_path_buf(), size)
            .with_identity(FileIdentity::from_metadata(path, &metadata))))
    }
}

fn is_excluded(entry: &DirEntry, excluded: &[PathBuf]) -> bool {
    let hit = entry.file_type().is_dir() && excluded.iter().any(|dir| entry.path() == dir.as_path());
    if hit {
        log::trace!("Ignoring directory: {}", entry.path().display());
    }
    hit
}

fn convert_walk_error(fallback: &Path, error: walkdir::Error) -> ScanError {
    let path = error.path().unwrap_or(fallback).to_path_buf();
    log::warn!("Walker error for {}: {}", path.display(), error);
    match error.into_io_error() {
        Some(io_error) => ScanError::from_io(&path, io_error),
        None => ScanError::Io {
            path,
            source: std::io::Error::other("filesystem loop detected"),
        },
    }
}
