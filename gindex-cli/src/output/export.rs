//! CSV export.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use gindex_core::{Language, ResultCache, ResultEntry};

/// Header row of every export.
pub const CSV_HEADER: [&str; 2] = ["Domain", "Total Results"];

/// Default export file name for `now`.
pub fn default_export_name(now: DateTime<Local>) -> String {
    now.format("GIndexChecker_%Y-%m-%d_%H-%M.csv").to_string()
}

/// Writes `view` as CSV in display order.
///
/// Quota-marker rows carry the localized label instead of a number.
pub fn write_results<W: Write>(writer: W, view: &ResultCache, language: Language) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);

    csv_writer.write_record(CSV_HEADER)?;
    for (domain, entry) in view.sorted() {
        let total = match entry {
            ResultEntry::Count(n) => n.to_string(),
            ResultEntry::QuotaExceeded => language.quota_exceeded_label().to_string(),
        };
        csv_writer.write_record([domain, total.as_str()])?;
    }
    csv_writer.flush()?;

    Ok(())
}

/// Writes `view` to `path`, returning the number of rows.
pub fn export_results(path: &Path, view: &ResultCache, language: Language) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_results(file, view, language)?;
    Ok(view.len())
}
