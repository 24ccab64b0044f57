//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping
//! - The active group table and its id allocation
//! - Block-by-block refinement
//! - Pipeline orchestration

pub mod finder;
pub mod groups;
pub mod refine;
pub mod table;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{group_by_size, DuplicateGroup, GroupingStats, SizeGroup};
pub use refine::{PassOutcome, PassStats, RefineStats, Refiner};
pub use table::{Group, GroupId, GroupTable};
