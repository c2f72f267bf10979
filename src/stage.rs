//! Stage contract: one pluggable step of the per-page pipeline.

use anyhow::Result;
use std::sync::Arc;

use crate::types::{Page, StageError};

/// A pipeline stage. Stages are shared read-only by every worker, hence `Send + Sync`.
///
/// The engine only calls [`Stager::query_page`]. [`Stager::paginate_query`] is for
/// stage authors building range-restricted fetches (see [`crate::stages::SqliteFetch`]).
pub trait Stager: Send + Sync {
    /// Populate or validate `page` in place. An error is recorded against the page.
    fn query_page(&self, page: &mut Page) -> Result<()>;

    /// Render the query that selects this page's rows.
    fn paginate_query(&self, page: &Page) -> String;

    /// Name used in logs and [`StageError`]s. Defaults to the bare type name.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// `a::b::Wrap<c::D>` → `Wrap`.
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Ordered stage list, applied left to right to every page.
pub type Pipeline = Vec<Arc<dyn Stager>>;

/// Run `stage` on `page`; a failure is pushed to `page.errors` and returned.
pub(crate) fn apply_stage(stage: &dyn Stager, page: &mut Page) -> Option<StageError> {
    match stage.query_page(page) {
        Ok(()) => None,
        Err(e) => {
            let err = StageError {
                page: page.number,
                stage: stage.name().to_string(),
                message: format!("{e:#}"),
            };
            page.errors.push(err.clone());
            Some(err)
        }
    }
}
