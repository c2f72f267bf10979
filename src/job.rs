//! Job: configuration plus the ordered stage pipeline; paginates, then runs.

use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

use crate::engine::progress::{ProgressBarConfig, create_progress_bar};
use crate::error::{JobError, JobResult};
use crate::paginate;
use crate::pipeline::{self, CancelToken, PipelineTuning, RunSignals};
use crate::stage::{Pipeline, Stager};
use crate::types::{ErrorPolicy, Page, Range, Row, StageError, default_row_type};
use crate::utils::profile::RunProfile;

/// Aggregate root for one paginated table run.
///
/// Call [`Job::paginate`] first; [`Job::run`] works on the pages it produced.
#[derive(Clone)]
pub struct Job {
    pub conn_string: String,
    pub total_rows_query: String,
    pub table_name: String,
    pub index_field: String,
    /// Prototype used to pack fetched values into rows.
    pub row_type: Row,

    pub page_size: usize,
    pub process_limit: usize,
    /// Configured range. Never overwritten; see [`Job::resolved_range`].
    pub page_range: Range,
    pub error_policy: ErrorPolicy,
    /// Show a progress bar while collecting pages.
    pub progress: bool,
    /// Log wall time and memory for each run.
    pub profile: bool,

    pub max_rows: usize,
    pub total_pages: usize,
    pub resolved_range: Range,
    pub pages: Vec<Page>,
    pub pipeline: Pipeline,

    cancel: CancelToken,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stages: Vec<&str> = self.pipeline.iter().map(|s| s.name()).collect();
        f.debug_struct("Job")
            .field("conn_string", &self.conn_string)
            .field("table_name", &self.table_name)
            .field("index_field", &self.index_field)
            .field("page_size", &self.page_size)
            .field("process_limit", &self.process_limit)
            .field("page_range", &self.page_range)
            .field("error_policy", &self.error_policy)
            .field("max_rows", &self.max_rows)
            .field("total_pages", &self.total_pages)
            .field("pages", &self.pages.len())
            .field("pipeline", &stages)
            .finish()
    }
}

impl Default for Job {
    fn default() -> Self {
        Self {
            conn_string: String::new(),
            total_rows_query: String::new(),
            table_name: String::new(),
            index_field: String::new(),
            row_type: default_row_type(),
            page_size: 0,
            process_limit: 1,
            page_range: Range::default(),
            error_policy: ErrorPolicy::default(),
            progress: false,
            profile: false,
            max_rows: 0,
            total_pages: 0,
            resolved_range: Range::default(),
            pages: Vec::new(),
            pipeline: Vec::new(),
            cancel: CancelToken::new(),
        }
    }
}

impl Job {
    pub fn new(index_field: &str, page_size: usize, process_limit: usize) -> Self {
        Self {
            index_field: index_field.to_string(),
            page_size,
            process_limit,
            ..Self::default()
        }
    }

    /// Append a stage; stages run in insertion order.
    pub fn with_stage<S: Stager + 'static>(mut self, stage: S) -> Self {
        self.pipeline.push(Arc::new(stage));
        self
    }

    /// Handle to cancel a run from another thread. Running pages finish their current
    /// stage; no further pages are started.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Replace a spent cancel token so the job can run again.
    pub fn reset_cancel(&mut self) {
        self.cancel = CancelToken::new();
    }

    /// Compute page descriptors for `max_rows` rows and store them on the job.
    /// On error the job's previous pagination is left untouched.
    pub fn paginate(&mut self, max_rows: usize) -> JobResult<()> {
        let p = paginate::paginate(
            max_rows,
            self.page_size,
            self.page_range,
            &self.index_field,
            &self.row_type,
        )?;
        self.max_rows = max_rows;
        self.page_size = p.page_size;
        self.total_pages = p.total_pages;
        self.resolved_range = p.range;
        self.pages = p.pages;
        Ok(())
    }

    /// Run one page through every stage, in order, on the calling thread.
    pub fn process_page(&self, page: Page) -> Page {
        pipeline::process_page(page, &self.pipeline, |_| {})
    }

    /// Push every page through the pipeline on `process_limit` workers.
    ///
    /// Returns the processed pages in completion order. Under [`ErrorPolicy::FailFast`] the
    /// first stage error fails the run and no pages are returned.
    pub fn run(&self) -> JobResult<Vec<Page>> {
        let mut profile = RunProfile::start(self.profile);
        if self.pages.is_empty() {
            return Err(JobError::NotPaginated);
        }
        if self.process_limit == 0 {
            return Err(JobError::InvalidArgument(
                "process limit must be at least 1".to_string(),
            ));
        }
        info!(
            "running {} pages through {} stages on {} workers",
            self.pages.len(),
            self.pipeline.len(),
            self.process_limit
        );

        let bar = self.progress.then(|| {
            create_progress_bar(ProgressBarConfig::new(
                self.pages.len(),
                "Pages",
                kdam::Animation::Classic,
            ))
        });

        let stages: Arc<[Arc<dyn Stager>]> = self.pipeline.clone().into();
        let handles = pipeline::run_pipeline(
            self.pages.clone(),
            stages,
            PipelineTuning {
                process_limit: self.process_limit,
                error_policy: self.error_policy,
            },
            RunSignals::new(self.cancel.clone()),
        );
        let outcome = pipeline::collect_pages(handles, bar.as_ref());
        if let Ok(pages) = &outcome {
            debug!("run complete: {} pages", pages.len());
        }
        profile.stop();
        outcome
    }
}

/// Stage errors of one page, for [`RunSummary`].
#[derive(Clone, Debug, Serialize)]
pub struct FailedPage {
    pub page: usize,
    pub errors: Vec<String>,
}

/// What a run produced, printable as JSON.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub table: String,
    pub max_rows: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub range: Range,
    pub pages: usize,
    pub rows: usize,
    pub failed: Vec<FailedPage>,
}

impl Job {
    /// Summarize `pages` (as returned by [`Job::run`]) against this job's pagination.
    pub fn summarize(&self, pages: &[Page]) -> RunSummary {
        let mut failed: Vec<FailedPage> = pages
            .iter()
            .filter(|p| p.has_errors())
            .map(|p| FailedPage {
                page: p.number,
                errors: p.errors.iter().map(StageError::to_string).collect(),
            })
            .collect();
        failed.sort_by_key(|f| f.page);
        RunSummary {
            table: self.table_name.clone(),
            max_rows: self.max_rows,
            page_size: self.page_size,
            total_pages: self.total_pages,
            range: self.resolved_range,
            pages: pages.len(),
            rows: pages.iter().map(|p| p.rows.len()).sum(),
            failed,
        }
    }
}
