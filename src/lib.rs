//! blockdupe - block-incremental duplicate file finder.
//!
//! Candidate files are grouped by size, then every group is read one block at
//! a time. Members whose blocks differ are split apart immediately, so files
//! that differ early are never read to the end. A group whose members are all
//! exhausted with identical blocks is a confirmed duplicate set.
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::duplicates::{DuplicateFinder, FinderConfig};
//! use blockdupe::scanner::WalkerConfig;
//! use std::path::Path;
//!
//! let config = FinderConfig::default()
//!     .with_walker_config(WalkerConfig::default().with_max_depth(4));
//! let (groups, summary) = DuplicateFinder::new(config)
//!     .find_duplicates(Path::new("/data"))
//!     .unwrap();
//!
//! for group in &groups {
//!     println!("{} files of {} bytes", group.len(), group.size);
//! }
//! println!("{} reclaimable", summary.reclaimable_display());
//! ```

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io;
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run one scan as described by the parsed command line.
///
/// Returns [`ExitCode::Success`] when duplicates were found and
/// [`ExitCode::NoDuplicates`] otherwise.
///
/// # Errors
///
/// Any configuration, walk or read failure aborts the run; no partial
/// report is written.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref(), &cli.overrides())
        .context("Invalid configuration")?;
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler()?;
    let mut finder_config = config
        .finder_config()
        .context("Invalid configuration")?
        .with_shutdown_flag(handler.flag());
    if cli.progress {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(cli.quiet)));
    }

    let finder = DuplicateFinder::new(finder_config);
    let (groups, summary) = finder.find_duplicates_in_paths(&config.include)?;

    let exit_code = if groups.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.output {
        OutputFormat::Text => TextOutput::new(&groups)
            .write_to(&mut out)
            .context("Failed to write report")?,
        OutputFormat::Json => JsonOutput::new(&groups, &summary, exit_code)
            .write_to(&mut out, true)
            .context("Failed to write report")?,
    }

    log::info!(
        "{} duplicate groups ({} files, {} reclaimable, {:.1}% of scanned bytes) in {:.2?}",
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.reclaimable_display(),
        summary.wasted_percentage(),
        summary.scan_duration
    );

    Ok(exit_code)
}
