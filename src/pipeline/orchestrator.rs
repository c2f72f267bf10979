use log::debug;
use std::sync::Arc;

use crate::engine::progress::{ProgressBar, update_progress_bar};
use crate::error::{JobError, JobResult};
use crate::stage::Stager;
use crate::types::Page;

use super::context::{PipelineHandles, PipelineTuning, RunSignals, create_pipeline_channels};
use super::error_handler::check_run_outcome;
use super::source::spawn_source_thread;
use super::workers::spawn_page_workers;

/// Start source and workers. Caller drains `results_rx` and must then join the handles;
/// [`collect_pages`] does both.
pub fn run_pipeline(
    pages: Vec<Page>,
    pipeline: Arc<[Arc<dyn Stager>]>,
    tuning: PipelineTuning,
    signals: RunSignals,
) -> PipelineHandles {
    let channels = create_pipeline_channels();
    let supplied = pages.len();

    let source_handle = spawn_source_thread(pages, channels.supply_tx, signals.clone());

    let worker_handles = spawn_page_workers(
        channels.supply_rx,
        &channels.results_tx,
        &channels.error_tx,
        pipeline,
        tuning.error_policy,
        &signals,
        tuning.process_limit,
    );

    // Dropping the last sender closes the channel so the sink stops once workers exit.
    drop(channels.results_tx);

    PipelineHandles {
        supplied,
        results_rx: channels.results_rx,
        error_rx: channels.error_rx,
        source_handle,
        worker_handles,
        signals,
        error_policy: tuning.error_policy,
    }
}

/// Join source and workers after the results channel has closed. Returns pages sent by the source.
pub fn shutdown_pipeline_handles(
    source_handle: std::thread::JoinHandle<usize>,
    worker_handles: Vec<std::thread::JoinHandle<()>>,
) -> JobResult<usize> {
    let mut panicked = false;
    for h in worker_handles {
        panicked |= h.join().is_err();
    }
    let sent = source_handle
        .join()
        .map_err(|_| JobError::WorkerPanicked("source"))?;
    if panicked {
        return Err(JobError::WorkerPanicked("page worker"));
    }
    Ok(sent)
}

/// Sink: drain processed pages in arrival order, join the pipeline, and decide the outcome.
/// Arrival order is completion order, not page order.
pub fn collect_pages(
    handles: PipelineHandles,
    progress: Option<&ProgressBar>,
) -> JobResult<Vec<Page>> {
    let PipelineHandles {
        supplied,
        results_rx,
        error_rx,
        source_handle,
        worker_handles,
        signals,
        error_policy,
    } = handles;

    let mut results = Vec::new();
    while let Ok(page) = results_rx.recv() {
        debug!("collected page {}", page.number);
        if let Some(bar) = progress {
            update_progress_bar(bar, 1);
        }
        results.push(page);
    }

    let sent = shutdown_pipeline_handles(source_handle, worker_handles)?;
    debug!(
        "sink: channel closed, {} of {} supplied pages collected",
        results.len(),
        sent
    );

    check_run_outcome(error_policy, &error_rx, &signals, supplied, &results)?;
    Ok(results)
}
