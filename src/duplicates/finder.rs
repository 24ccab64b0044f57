//! Duplicate finder pipeline.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Walk**: collect candidate files from every include root
//! 2. **Size grouping**: bucket candidates by exact size (see [`crate::duplicates::groups`])
//! 3. **Refinement**: hash one block per pass and split groups as soon as
//!    their content diverges (see [`crate::duplicates::refine`])
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::duplicates::{DuplicateFinder, FinderConfig};
//! use blockdupe::scanner::{Checksum, HashSettings};
//! use std::path::PathBuf;
//!
//! let config = FinderConfig::default()
//!     .with_hash_settings(HashSettings::new(4096, Checksum::Crc32).unwrap());
//! let finder = DuplicateFinder::new(config);
//!
//! let (groups, summary) = finder
//!     .find_duplicates_in_paths(&[PathBuf::from("/data/a"), PathBuf::from("/data/b")])
//!     .unwrap();
//! println!("{} groups, {} reclaimable", groups.len(), summary.reclaimable_display());
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;

use super::groups::{group_by_size, DuplicateGroup};
use super::refine::Refiner;
use super::table::GroupTable;
use crate::config::ConfigError;
use crate::progress::ProgressCallback;
use crate::scanner::{
    FileEntry, FileIdentity, HashError, HashSettings, ScanError, Walker, WalkerConfig,
};

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads used to read blocks within a pass.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Block size and checksum.
    pub hash_settings: HashSettings,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("hash_settings", &self.hash_settings)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            hash_settings: HashSettings::default(),
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the I/O thread count (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the block size and checksum.
    #[must_use]
    pub fn with_hash_settings(mut self, settings: HashSettings) -> Self {
        self.hash_settings = settings;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Total number of candidate files
    pub total_files: usize,
    /// Total size of all candidate files in bytes
    pub total_size: u64,
    /// Number of files eliminated by size grouping (unique sizes)
    pub eliminated_by_size: usize,
    /// Number of refinement passes
    pub refinement_passes: usize,
    /// Bytes read while refining
    pub bytes_hashed: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding one original per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Percentage of the scanned bytes taken by duplicate copies.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A walk error occurred.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A block could not be read.
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Duplicate finder that orchestrates the detection pipeline.
///
/// Any I/O failure aborts the whole run: no partial report is produced.
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under a single root.
    ///
    /// # Errors
    ///
    /// See [`find_duplicates_in_paths`](Self::find_duplicates_in_paths).
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        self.find_duplicates_in_paths(&[path.to_path_buf()])
    }

    /// Find all duplicate files under several include roots.
    ///
    /// A file reachable through more than one path (overlapping roots,
    /// hardlinks, followed symlinks) is considered once, under the path it
    /// was first discovered at.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - no root is given
    /// - a root does not exist or is not a directory
    /// - any directory or file cannot be read
    /// - the scan is interrupted by shutdown signal
    pub fn find_duplicates_in_paths(
        &self,
        roots: &[PathBuf],
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();

        if roots.is_empty() {
            return Err(ConfigError::NoIncludeDirs.into());
        }
        for root in roots {
            if !root.exists() {
                return Err(FinderError::PathNotFound(root.clone()));
            }
            if !root.is_dir() {
                return Err(FinderError::NotADirectory(root.clone()));
            }
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
        }

        let mut seen: HashSet<FileIdentity> = HashSet::new();
        let mut files = Vec::new();
        for root in roots {
            log::info!("Scanning {}", root.display());
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_message(&format!("Walking {}", root.display()));
            }

            let mut walker = Walker::new(root, self.config.walker_config.clone());
            if let Some(ref flag) = self.config.shutdown_flag {
                walker = walker.with_shutdown_flag(flag.clone());
            }

            for result in walker.walk() {
                let file = result?;
                if seen.insert(file.identity()) {
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(files.len() + 1, &file.path.to_string_lossy());
                    }
                    files.push(file);
                } else {
                    log::trace!("Same file already collected: {}", file.path.display());
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }

        // The walker stops silently on shutdown
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        self.detect(files, start_time)
    }

    /// Find duplicates from a pre-collected list of files.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if a file cannot be read or the scan is
    /// interrupted.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        self.detect(files, Instant::now())
    }

    fn detect(
        &self,
        files: Vec<FileEntry>,
        start_time: Instant,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let (size_groups, size_stats) = group_by_size(files);

        let mut summary = ScanSummary {
            total_files: size_stats.total_files,
            total_size: size_stats.total_size,
            eliminated_by_size: size_stats.eliminated_unique,
            ..Default::default()
        };

        log::info!(
            "Found {} files ({} total)",
            summary.total_files,
            summary.total_size_display()
        );

        if size_groups.is_empty() {
            log::info!("No potential duplicates found after size grouping");
            summary.scan_duration = start_time.elapsed();
            return Ok((Vec::new(), summary));
        }

        let table = GroupTable::from_size_groups(
            size_groups.into_iter().map(|g| (g.size, g.files)),
            self.config.hash_settings,
        );
        log::info!(
            "Refining {} groups ({} files) in {}-byte blocks using {}",
            table.len(),
            table.file_count(),
            self.config.hash_settings.block_size(),
            self.config.hash_settings.checksum()
        );

        let mut refiner = Refiner::new(self.config.io_threads);
        if let Some(ref flag) = self.config.shutdown_flag {
            refiner = refiner.with_shutdown_flag(flag.clone());
        }
        if let Some(ref callback) = self.config.progress_callback {
            refiner = refiner.with_progress_callback(callback.clone());
        }

        let (groups, refine_stats) = refiner.run(table)?;

        summary.refinement_passes = refine_stats.passes;
        summary.bytes_hashed = refine_stats.bytes_read;
        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok((groups, summary))
    }
}
