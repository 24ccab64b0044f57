//! Plain text report.
//!
//! Each confirmed group is printed as its member paths, one per line, in
//! discovery order, followed by a blank line.

use std::io::{self, Write};

use crate::duplicates::DuplicateGroup;

/// Text formatter over a slice of groups.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> TextOutput<'a> {
    /// Wrap the groups to report.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns any error raised by `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for group in self.groups {
            for path in &group.paths {
                writeln!(writer, "{}", path.display())?;
            }
            writeln!(writer)?;
        }
        writer.flush()
    }

    /// Render the report to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}
