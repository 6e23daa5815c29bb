//! Plain-text output for terminals.

use std::io::{self, Write};

use bytesize::ByteSize;

use crate::actions::DeletionReport;
use crate::session::ScanSession;

/// Human-readable rendering of a session.
pub struct TextOutput<'a> {
    session: &'a ScanSession,
}

impl<'a> TextOutput<'a> {
    /// Wrap a session for printing.
    #[must_use]
    pub fn new(session: &'a ScanSession) -> Self {
        Self { session }
    }

    /// Write groups, errors and a summary line.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let groups = self.session.groups();
        if groups.is_empty() {
            writeln!(writer, "No duplicates found in {}", self.session.root().display())?;
        }

        for (idx, group) in groups.iter().enumerate() {
            writeln!(
                writer,
                "Group {} ({} copies, {} each, {})",
                idx + 1,
                group.len(),
                ByteSize::b(group.size),
                &group.hash_hex()[..16]
            )?;
            for file in &group.files {
                let marker = if file.address.is_archive_member() {
                    "  [archive]"
                } else {
                    ""
                };
                writeln!(writer, "  {}{}", file.address, marker)?;
            }
            writeln!(writer)?;
        }

        let errors = self.session.error_listing();
        if !errors.is_empty() {
            writeln!(writer, "Could not process {} item(s):", errors.len())?;
            for (_, message) in &errors {
                writeln!(writer, "  {message}")?;
            }
            writeln!(writer)?;
        }

        let summary = self.session.summary();
        writeln!(
            writer,
            "Scanned {} files and {} archive members ({}) in {:.2}s: {} groups, {} reclaimable",
            summary.total_files,
            summary.archive_members,
            summary.total_size_display(),
            summary.scan_duration.as_secs_f64(),
            summary.duplicate_groups,
            summary.reclaimable_display()
        )
    }
}

/// Write one line per deletion outcome followed by the report summary.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_report<W: Write>(report: &DeletionReport, writer: &mut W) -> io::Result<()> {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(bytes) => writeln!(writer, "  ok     {} ({})", outcome.address, ByteSize::b(*bytes))?,
            Err(e) => writeln!(writer, "  failed {}: {}", outcome.address, e)?,
        }
    }
    writeln!(writer, "{}", report.summary())
}
