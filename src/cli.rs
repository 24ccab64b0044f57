//! Command-line interface definitions for blockdupe.
//!
//! This module defines all CLI arguments using the clap derive API.
//! Every scan setting is optional here so that unset flags fall through to
//! the config file and environment layers (see [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # Scan two trees, three levels deep
//! blockdupe --include "/data/photos;/backup/photos" --depth 3
//!
//! # Only log files, 4 KiB blocks, CRC-32, JSON report
//! blockdupe -i /var/log --filter "*.log" --block-size 4KiB --checksum crc32 -o json
//!
//! # Skip a subtree
//! blockdupe -i ~/src -e ~/src/target --depth 10
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{split_path_list, Overrides};

/// Block-incremental duplicate file finder.
///
/// Files are grouped by size, then read one block at a time; groups split as
/// soon as their content diverges, so unique files are rarely read to the end.
#[derive(Debug, Parser)]
#[command(name = "blockdupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories to scan (semicolon-separated, repeatable)
    #[arg(short, long, value_name = "DIRS")]
    pub include: Vec<String>,

    /// Directories to skip, with everything below them (semicolon-separated, repeatable)
    #[arg(short, long, value_name = "DIRS")]
    pub exclude: Vec<String>,

    /// Subdirectory levels to descend (0 = only files directly in each root)
    #[arg(short, long, visible_alias = "scan-level", value_name = "N")]
    pub depth: Option<usize>,

    /// Minimum file size to consider (e.g., 0, 1KB, 1MiB) [default: 1]
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Case-insensitive glob matched against file names (e.g., "*.log")
    #[arg(short, long, value_name = "GLOB")]
    pub filter: Option<String>,

    /// Bytes read per file on each pass (e.g., 10, 4KiB) [default: 10]
    #[arg(short, long, value_name = "SIZE", value_parser = parse_block_size)]
    pub block_size: Option<usize>,

    /// Block checksum: md5 or crc32 [default: md5]
    #[arg(short, long, value_name = "NAME")]
    pub checksum: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Number of threads reading blocks in parallel [default: 4]
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Follow symbolic links while walking
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Config file to load instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show progress spinners on stderr
    #[arg(long, conflicts_with = "quiet")]
    pub progress: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One path per line, blank line after each group
    #[default]
    Text,
    /// JSON document with groups and summary
    Json,
}

impl Cli {
    /// Scan settings given on the command line.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            include: self.include.iter().flat_map(|s| split_path_list(s)).collect(),
            exclude: self.exclude.iter().flat_map(|s| split_path_list(s)).collect(),
            depth: self.depth,
            min_size: self.min_size,
            filter: self.filter.clone(),
            block_size: self.block_size,
            checksum: self.checksum.clone(),
            io_threads: self.io_threads,
            follow_symlinks: self.follow_symlinks,
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Decimal suffixes (KB, MB, GB, TB) are powers of 1000, binary suffixes
/// (KiB, MiB, GiB, TiB) powers of 1024. Case-insensitive.
///
/// # Errors
///
/// Returns an error message for empty input, a malformed number or an
/// unknown suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(split);
    let suffix = suffix.trim().to_ascii_uppercase();

    let value: f64 = number
        .parse()
        .map_err(|_| format!("Invalid number: '{number}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1 << 10,
        "MB" | "M" => 1_000_000,
        "MIB" => 1 << 20,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1 << 30,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1 << 40,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((value * multiplier as f64) as u64)
}

/// Parse a block size; zero is rejected.
fn parse_block_size(s: &str) -> Result<usize, String> {
    let bytes = parse_size(s)?;
    if bytes == 0 {
        return Err("Block size must be at least 1 byte".to_string());
    }
    usize::try_from(bytes).map_err(|_| format!("Block size too large: {bytes}"))
}
