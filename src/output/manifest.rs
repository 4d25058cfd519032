//! Plain-text duplicate manifest.
//!
//! One separator line per duplicate group, followed by one tab-separated line
//! per member:
//!
//! ```text
//! --------------------------------------------------------------------------------
//! report.pdf	/home/ann/docs	1.2 MiB	2024-03-01 09:12:44
//! report.pdf	/home/ann/backup	1.2 MiB	2023-11-20 17:03:10
//! ```
//!
//! Console manifests use an 80 character separator, manifests written to a
//! file a 150 character one. Files that could not be compared are listed
//! after an `=` separator. File manifests end with the summary line
//! `N duplicate files in SIZE.`; on the console that line is logged instead.
//!
//! Manifest files conventionally use the `.ccdup` extension and are skipped
//! by later scans unless `--include-manifests` is given.

use std::io::{self, Write};
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::duplicates::{format_size, ScanResult};

/// Separator width on a terminal.
pub const CONSOLE_SEPARATOR_WIDTH: usize = 80;

/// Separator width in a manifest file.
pub const FILE_SEPARATOR_WIDTH: usize = 150;

/// Where a manifest is going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestTarget {
    /// Standard output
    Console,
    /// A manifest file
    File,
}

impl ManifestTarget {
    fn separator_width(self) -> usize {
        match self {
            Self::Console => CONSOLE_SEPARATOR_WIDTH,
            Self::File => FILE_SEPARATOR_WIDTH,
        }
    }
}

/// Writes a [`ScanResult`] as a text manifest.
#[derive(Debug)]
pub struct ManifestWriter<'a> {
    result: &'a ScanResult,
    target: ManifestTarget,
}

impl<'a> ManifestWriter<'a> {
    /// Create a writer for `result`.
    #[must_use]
    pub fn new(result: &'a ScanResult, target: ManifestTarget) -> Self {
        Self { result, target }
    }

    /// Write the manifest.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let width = self.target.separator_width();
        let group_separator = "-".repeat(width);
        let major_separator = "=".repeat(width);

        for group in &self.result.groups {
            writeln!(writer, "{group_separator}")?;
            let size = format_size(group.representative_length());
            for file in group.files() {
                writeln!(
                    writer,
                    "{}\t{}\t{}\t{}",
                    file.file_name(),
                    file.directory().display(),
                    size,
                    format_timestamp(file.created.unwrap_or(file.modified))
                )?;
            }
        }

        if !self.result.failed.is_empty() {
            writeln!(writer, "{major_separator}")?;
            writeln!(writer, "Failed to read {} files.", self.result.failed.len())?;
            for failed in &self.result.failed {
                writeln!(writer, "{}", failed.entry.path.display())?;
            }
        }

        if self.target == ManifestTarget::File {
            writeln!(writer, "{major_separator}")?;
            writeln!(writer, "{}", self.result.summary.headline())?;
        }

        writer.flush()
    }

    /// Render the manifest into a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Format a timestamp in local time, `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
