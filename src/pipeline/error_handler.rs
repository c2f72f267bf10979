use crossbeam_channel::Receiver;
use log::warn;

use crate::error::{JobError, JobResult};
use crate::types::{ErrorPolicy, Page, StageError};

use super::context::RunSignals;

/// Decide a run's outcome after the sink has drained and all threads are joined.
///
/// Fail-fast: the first stage error fails the run. Otherwise a caller cancel fails it.
/// Collect-all: failures stay on the pages; only a caller cancel fails the run.
/// A cancel counts only when it cost pages: fewer than `supplied` were collected.
pub fn check_run_outcome(
    policy: ErrorPolicy,
    error_rx: &Receiver<StageError>,
    signals: &RunSignals,
    supplied: usize,
    results: &[Page],
) -> JobResult<()> {
    let first = error_rx.try_recv().ok();
    if policy == ErrorPolicy::FailFast
        && let Some(err) = first
    {
        return Err(JobError::Stage(err));
    }
    if signals.user.is_cancelled() && results.len() < supplied {
        return Err(JobError::Cancelled {
            completed: results.len(),
        });
    }
    let failed = failed_pages(results).count();
    if failed > 0 {
        warn!("{} of {} pages finished with stage errors", failed, results.len());
    }
    Ok(())
}

/// Pages carrying at least one stage error.
pub fn failed_pages(results: &[Page]) -> impl Iterator<Item = &Page> {
    results.iter().filter(|p| p.has_errors())
}
