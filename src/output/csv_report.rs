//! CSV page report
//!
//! One row per page record, multi-valued fields joined with `;`. Quoting follows the
//! usual CSV rules: fields containing a comma, quote or newline are wrapped in double
//! quotes with inner quotes doubled.

use crate::crawler::PageRecord;
use crate::output::{OutputError, OutputResult};
use std::collections::BTreeMap;
use std::path::Path;

/// Header row of the report
pub const CSV_HEADERS: [&str; 5] = [
    "page_url",
    "h1",
    "first_paragraph",
    "outgoing_link_urls",
    "image_urls",
];

/// Formats page records as a CSV document, ordered by normalized URL
pub fn format_csv_report(pages: &BTreeMap<String, PageRecord>) -> OutputResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for page in pages.values() {
        let links = page.outgoing_links.join(";");
        let images = page.image_urls.join(";");
        writer.write_record([
            page.url.as_str(),
            page.heading.as_str(),
            page.first_paragraph.as_str(),
            links.as_str(),
            images.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| OutputError::Write(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| OutputError::Write(e.to_string()))
}

/// Writes the CSV report to `path`
///
/// # Returns
///
/// * `Ok(rows)` - Number of page rows written; 0 means there was nothing to write and no
///   file was created
/// * `Err(OutputError)` - Formatting or writing failed
pub fn write_csv_report(
    pages: &BTreeMap<String, PageRecord>,
    path: &Path,
) -> OutputResult<usize> {
    if pages.is_empty() {
        tracing::warn!("No data to write to CSV");
        return Ok(0);
    }

    let report = format_csv_report(pages)?;
    std::fs::write(path, report)?;

    tracing::info!("Wrote {} rows to {}", pages.len(), path.display());
    Ok(pages.len())
}
