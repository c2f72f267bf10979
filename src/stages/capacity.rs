use anyhow::{Result, bail};

use crate::stage::Stager;
use crate::types::Page;

/// Fails a page holding more rows than its capacity. Short pages pass; the table may
/// have shrunk since it was counted.
#[derive(Clone, Copy, Debug, Default)]
pub struct CapacityCheck;

impl Stager for CapacityCheck {
    fn query_page(&self, page: &mut Page) -> Result<()> {
        if page.rows.len() > page.total_rows {
            bail!(
                "{} rows exceed page capacity {}",
                page.rows.len(),
                page.total_rows
            );
        }
        Ok(())
    }

    /// Not query-backed.
    fn paginate_query(&self, _page: &Page) -> String {
        String::new()
    }

    fn name(&self) -> &str {
        "capacity-check"
    }
}
