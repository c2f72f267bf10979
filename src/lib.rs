//! Pagerun: paginated table processing on a bounded worker pool

pub mod engine;
pub mod error;
pub mod job;
pub mod paginate;
pub mod pipeline;
pub mod stage;
pub mod stages;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use error::{JobError, JobResult};
pub use job::{FailedPage, Job, RunSummary};
pub use pipeline::CancelToken;
pub use stage::{Pipeline, Stager};
pub use types::*;

use log::debug;

use crate::stages::default_total_rows_query;
use crate::utils::config::WorkerLimits;

/// Result alias used by the application layer
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Build an unpaginated job with no stages from CLI/config options.
///
/// Fills the defaults the options leave open: total-rows query (`SELECT COUNT(*)` over
/// the table) and worker count (rayon's thread count).
pub fn job_from_opts(opts: &Opts, conn_string: &str) -> Job {
    let mut job = Job::new(&opts.index_field, opts.page_size, 1);
    job.conn_string = conn_string.to_string();
    job.total_rows_query = opts
        .total_rows_query
        .clone()
        .unwrap_or_else(|| default_total_rows_query(&opts.table_name));
    job.table_name = opts.table_name.clone();
    job.process_limit = opts
        .process_limit
        .unwrap_or_else(WorkerLimits::default_process_limit);
    job.page_range = opts.page_range;
    job.error_policy = opts.error_policy;
    job.progress = opts.verbose;
    job.profile = opts.profile;
    debug!(
        "{} JOB:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        job
    );
    job
}
