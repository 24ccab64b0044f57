//! Report formatters for duplicate scan results.
//!
//! - [`text`]: one path per line, a blank line after each group
//! - [`json`]: machine-readable document for scripting
//!
//! Neither format includes file content or digests.
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::duplicates::DuplicateFinder;
//! use blockdupe::output::TextOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, _summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! TextOutput::new(&groups).write_to(&mut std::io::stdout()).unwrap();
//! ```

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;
