//! CSV output for collected pages.

use anyhow::{Context, Result};
use std::path::Path;

use crate::types::Page;

/// Write `header` then `rows` to `path`, replacing any existing file.
pub fn write_csv<H, R>(path: &Path, header: &[H], rows: R) -> Result<usize>
where
    H: AsRef<str>,
    R: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("create CSV file {}", path.display()))?;
    if !header.is_empty() {
        writer
            .write_record(header.iter().map(|h| h.as_ref()))
            .context("write CSV header")?;
    }
    let mut written = 0_usize;
    for row in rows {
        writer.write_record(&row).context("write CSV row")?;
        written += 1;
    }
    writer.flush().context("flush CSV file")?;
    Ok(written)
}

/// Rows of `pages` as CSV records, pages in page-number order.
pub fn page_records(pages: &[Page]) -> Vec<Vec<String>> {
    let mut ordered: Vec<&Page> = pages.iter().collect();
    ordered.sort_by_key(|p| p.number);
    ordered
        .into_iter()
        .flat_map(|p| p.rows.iter())
        .map(|row| row.unpack().iter().map(|v| v.to_field()).collect())
        .collect()
}
