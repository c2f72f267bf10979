use crossbeam_channel::{Receiver, Sender, select};
use log::{debug, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::stage::{Stager, apply_stage};
use crate::types::{ErrorPolicy, Page, StageError};

use super::context::RunSignals;

/// Thread `page` through every stage in order. Failures are recorded on the page and passed
/// to `on_error`; later stages still run on the same page.
pub fn process_page<F>(mut page: Page, pipeline: &[Arc<dyn Stager>], mut on_error: F) -> Page
where
    F: FnMut(&StageError),
{
    for stage in pipeline {
        if let Some(err) = apply_stage(stage.as_ref(), &mut page) {
            on_error(&err);
        }
    }
    page
}

/// Offer `err` to the run's error channel. The channel holds one error; the first offer wins.
fn report_stage_error(
    err: &StageError,
    error_tx: &Sender<StageError>,
    policy: ErrorPolicy,
    signals: &RunSignals,
) {
    if error_tx.try_send(err.clone()).is_ok() {
        warn!("{}", err);
        if policy == ErrorPolicy::FailFast {
            signals.abort.cancel();
        }
    } else {
        debug!("{}", err);
    }
}

/// Single page worker: receive from supply_rx, run the pipeline, send on results_tx.
/// Every channel operation also waits on the stop signals.
fn page_worker_loop(
    worker_id: usize,
    supply_rx: Receiver<Page>,
    results_tx: Sender<Page>,
    error_tx: Sender<StageError>,
    pipeline: Arc<[Arc<dyn Stager>]>,
    policy: ErrorPolicy,
    signals: RunSignals,
) {
    let mut processed = 0_usize;
    loop {
        if signals.is_set() {
            break;
        }
        let page = select! {
            recv(supply_rx) -> msg => match msg {
                Ok(page) => page,
                Err(_) => break,
            },
            recv(signals.user.signal()) -> _ => break,
            recv(signals.abort.signal()) -> _ => break,
        };
        let page = process_page(page, &pipeline, |err| {
            report_stage_error(err, &error_tx, policy, &signals)
        });
        processed += 1;
        select! {
            send(results_tx, page) -> res => {
                if res.is_err() {
                    break;
                }
            }
            recv(signals.user.signal()) -> _ => break,
            recv(signals.abort.signal()) -> _ => break,
        }
    }
    debug!("worker {}: exiting after {} pages", worker_id, processed);
}

/// Spawn `process_limit` page workers. Caller must drop its own `results_tx` after this so
/// the results channel closes once every worker exits.
pub fn spawn_page_workers(
    supply_rx: Receiver<Page>,
    results_tx: &Sender<Page>,
    error_tx: &Sender<StageError>,
    pipeline: Arc<[Arc<dyn Stager>]>,
    policy: ErrorPolicy,
    signals: &RunSignals,
    process_limit: usize,
) -> Vec<JoinHandle<()>> {
    (0..process_limit)
        .map(|worker_id| {
            let supply_rx = supply_rx.clone();
            let results_tx = results_tx.clone();
            let error_tx = error_tx.clone();
            let pipeline = Arc::clone(&pipeline);
            let signals = signals.clone();
            thread::spawn(move || {
                page_worker_loop(
                    worker_id, supply_rx, results_tx, error_tx, pipeline, policy, signals,
                )
            })
        })
        .collect()
}
