//! Block-by-block group refinement.
//!
//! # Overview
//!
//! The [`Refiner`] drives the [`GroupTable`] to a fixed point. Each pass reads
//! the next block of every member of every active group and re-partitions the
//! group by digest:
//!
//! - **Kept**: every member produced the same digest. The group stays under
//!   its id, or leaves the table as a confirmed duplicate set when all
//!   members are exhausted.
//! - **Split**: digests diverged. The group is removed; every digest bucket
//!   with two or more members becomes a new group with a fresh id, and
//!   singleton buckets are dropped (closing their files).
//!
//! A pass is read-all-then-commit: every group is hashed (in parallel, on a
//! bounded pool) before any group is reinserted, so no group is ever visible
//! to two passes. Shutdown is checked between passes only.
//!
//! Every pass advances every active member by at least one byte, so the loop
//! always terminates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::finder::FinderError;
use super::groups::DuplicateGroup;
use super::table::{Group, GroupId, GroupTable};
use crate::progress::ProgressCallback;
use crate::scanner::{ChunkHasher, Digest, HashError};

/// Statistics for a single refinement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassStats {
    /// 1-based pass number
    pub pass: usize,
    /// Groups hashed in this pass
    pub active_groups: usize,
    /// Groups whose members all agreed on this block
    pub kept_groups: usize,
    /// Groups removed because digests diverged
    pub split_groups: usize,
    /// Groups created from split buckets
    pub created_groups: usize,
    /// Groups confirmed as duplicate sets in this pass
    pub finished_groups: usize,
    /// Files dropped as no longer duplicate candidates
    pub dropped_files: usize,
    /// Bytes read in this pass
    pub bytes_read: u64,
}

/// Result of a single pass.
#[derive(Debug, Clone, Default)]
pub struct PassOutcome {
    /// Pass statistics
    pub stats: PassStats,
    /// Duplicate sets confirmed in this pass, in ascending id order
    pub finished: Vec<DuplicateGroup>,
}

/// Totals over a whole refinement run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefineStats {
    /// Number of passes run
    pub passes: usize,
    /// Total bytes read
    pub bytes_read: u64,
    /// Total group splits
    pub split_groups: usize,
    /// Total files dropped after a split
    pub dropped_files: usize,
    /// Total confirmed duplicate sets
    pub finished_groups: usize,
}

impl RefineStats {
    fn record(&mut self, pass: &PassStats) {
        self.passes = self.passes.max(pass.pass);
        self.bytes_read += pass.bytes_read;
        self.split_groups += pass.split_groups;
        self.dropped_files += pass.dropped_files;
        self.finished_groups += pass.finished_groups;
    }
}

/// What hashing one block did to a group.
enum Outcome {
    Kept(Group),
    Split {
        parent: GroupId,
        size: u64,
        buckets: Vec<Vec<ChunkHasher>>,
    },
}

/// Refinement engine.
pub struct Refiner {
    pool: Option<rayon::ThreadPool>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Refiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refiner")
            .field(
                "threads",
                &self.pool.as_ref().map(rayon::ThreadPool::current_num_threads),
            )
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Refiner {
    /// Create a refiner reading with at most `io_threads` threads.
    #[must_use]
    pub fn new(io_threads: usize) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(io_threads.max(1))
            .thread_name(|i| format!("blockdupe-io-{i}"))
            .build()
            .map_err(|e| {
                log::warn!(
                    "Failed to create I/O thread pool, using global pool with {} threads: {}",
                    rayon::current_num_threads(),
                    e
                );
            })
            .ok();
        Self {
            pool,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag checked between passes.
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

    /// Refine `table` until no active group remains.
    ///
    /// Returns the confirmed duplicate sets in the order they finished.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Hash`] on the first I/O failure and
    /// [`FinderError::Interrupted`] if shutdown is requested between passes.
    /// No partial result is returned in either case.
    pub fn run(
        &self,
        mut table: GroupTable,
    ) -> Result<(Vec<DuplicateGroup>, RefineStats), FinderError> {
        let mut stats = RefineStats::default();

        // Groups of empty files are complete before any read
        let mut results: Vec<DuplicateGroup> = table
            .take_finished()
            .into_iter()
            .map(into_duplicate_group)
            .collect();
        stats.finished_groups = results.len();

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start("refine", table.file_count());
        }

        let mut pass = 0;
        while !table.is_empty() {
            if self.is_shutdown_requested() {
                log::info!("Refinement interrupted after {} passes", pass);
                return Err(FinderError::Interrupted);
            }

            pass += 1;
            let outcome = self.pass(&mut table, pass)?;
            stats.record(&outcome.stats);
            results.extend(outcome.finished);

            if let Some(ref callback) = self.progress_callback {
                callback.on_progress(
                    pass,
                    &format!("pass {}: {} groups active", pass, table.len()),
                );
            }
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end("refine");
        }

        log::info!(
            "Refinement complete: {} duplicate groups after {} passes ({} bytes read)",
            results.len(),
            stats.passes,
            stats.bytes_read
        );

        Ok((results, stats))
    }

    /// Run one refinement pass over every group in `table`.
    ///
    /// On return the table holds the groups that are still active; groups
    /// confirmed in this pass are returned in the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Hash`] if any member cannot be read. The table
    /// is left empty in that case.
    pub fn pass(&self, table: &mut GroupTable, number: usize) -> Result<PassOutcome, FinderError> {
        let groups = table.drain();
        let mut stats = PassStats {
            pass: number,
            active_groups: groups.len(),
            ..Default::default()
        };

        let hashed = || -> Result<Vec<(Outcome, u64)>, HashError> {
            groups.into_par_iter().map(hash_next_block).collect()
        };
        let outcomes = match &self.pool {
            Some(pool) => pool.install(hashed),
            None => hashed(),
        }?;

        for (outcome, bytes) in outcomes {
            stats.bytes_read += bytes;
            match outcome {
                Outcome::Kept(group) => {
                    stats.kept_groups += 1;
                    table.reinsert(group);
                }
                Outcome::Split {
                    parent,
                    size,
                    buckets,
                } => {
                    stats.split_groups += 1;
                    log::trace!("Group {} split into {} buckets", parent, buckets.len());
                    for bucket in buckets {
                        if bucket.len() < 2 {
                            for member in &bucket {
                                log::trace!("Dropped unique file: {}", member.path().display());
                            }
                            stats.dropped_files += bucket.len();
                        } else if let Some(child) = table.create(size, bucket) {
                            log::trace!("Group {} created from {}", child, parent);
                            stats.created_groups += 1;
                        }
                    }
                }
            }
        }

        let finished: Vec<DuplicateGroup> = table
            .take_finished()
            .into_iter()
            .map(into_duplicate_group)
            .collect();
        stats.finished_groups = finished.len();

        log::debug!(
            "Pass {}: {} active, {} kept, {} split, {} created, {} finished, {} dropped, {} bytes",
            stats.pass,
            stats.active_groups,
            stats.kept_groups,
            stats.split_groups,
            stats.created_groups,
            stats.finished_groups,
            stats.dropped_files,
            stats.bytes_read
        );

        Ok(PassOutcome { stats, finished })
    }
}

/// Read the next block of every member and partition the group by digest.
fn hash_next_block(mut group: Group) -> Result<(Outcome, u64), HashError> {
    let mut bytes = 0u64;
    let mut digests: Vec<Digest> = Vec::with_capacity(group.len());
    for member in group.members_mut() {
        let before = member.position();
        digests.push(member.next_chunk()?);
        bytes += member.position() - before;
    }

    if digests.windows(2).all(|pair| pair[0] == pair[1]) {
        return Ok((Outcome::Kept(group), bytes));
    }

    let parent = group.id();
    let size = group.size();
    let mut index: HashMap<Digest, usize> = HashMap::new();
    let mut buckets: Vec<Vec<ChunkHasher>> = Vec::new();
    for (member, digest) in group.into_members().into_iter().zip(digests) {
        let slot = *index.entry(digest).or_insert_with(|| {
            buckets.push(Vec::new());
            buckets.len() - 1
        });
        buckets[slot].push(member);
    }

    Ok((
        Outcome::Split {
            parent,
            size,
            buckets,
        },
        bytes,
    ))
}

fn into_duplicate_group(group: Group) -> DuplicateGroup {
    let id = group.id();
    let size = group.size();
    let paths = group
        .into_members()
        .into_iter()
        .map(|member| member.path().to_path_buf())
        .collect();
    log::debug!("Group {} confirmed ({} bytes)", id, size);
    DuplicateGroup::new(id, size, paths)
}
