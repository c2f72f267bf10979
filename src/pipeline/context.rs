//! Pipeline context: channels, cancellation, and run tuning shared by source, workers and sink.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::types::{ErrorPolicy, Page, StageError};
use crate::utils::config::ChannelCaps;

/// Cancellation handle. Clones share state; cancelling any clone cancels all of them.
///
/// Cancelling drops the only sender of an internal channel, so [`CancelToken::signal`]
/// becomes ready in every `select!` waiting on it. Idempotent.
#[derive(Clone, Debug)]
pub struct CancelToken {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    signal: Receiver<()>,
    cancelled: Arc<AtomicBool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = bounded::<()>(0);
        Self {
            trigger: Arc::new(Mutex::new(Some(tx))),
            signal: rx,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        let sender = self
            .trigger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if sender.is_some() {
            self.cancelled.store(true, Ordering::SeqCst);
        }
        drop(sender);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Never yields a message; disconnects once cancelled. For use in `select!`.
    pub fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}

/// Stop signals for one run: the caller's token and a run-scoped abort raised on the
/// first stage error under [`ErrorPolicy::FailFast`].
#[derive(Clone, Debug)]
pub struct RunSignals {
    pub user: CancelToken,
    pub abort: CancelToken,
}

impl RunSignals {
    pub fn new(user: CancelToken) -> Self {
        Self {
            user,
            abort: CancelToken::new(),
        }
    }

    pub fn is_set(&self) -> bool {
        self.user.is_cancelled() || self.abort.is_cancelled()
    }
}

/// Worker count and failure handling for one run.
#[derive(Clone, Copy, Debug)]
pub struct PipelineTuning {
    pub process_limit: usize,
    pub error_policy: ErrorPolicy,
}

/// Channels for one run. Source gets supply_tx; workers get supply_rx, results_tx, error_tx;
/// the sink keeps results_rx and error_rx.
pub struct PipelineChannels {
    pub supply_tx: Sender<Page>,
    pub supply_rx: Receiver<Page>,
    pub results_tx: Sender<Page>,
    pub results_rx: Receiver<Page>,
    pub error_tx: Sender<StageError>,
    pub error_rx: Receiver<StageError>,
}

pub fn create_pipeline_channels() -> PipelineChannels {
    let (supply_tx, supply_rx) = bounded::<Page>(ChannelCaps::SUPPLY);
    let (results_tx, results_rx) = bounded::<Page>(ChannelCaps::RESULTS);
    let (error_tx, error_rx) = bounded::<StageError>(ChannelCaps::ERRORS);
    PipelineChannels {
        supply_tx,
        supply_rx,
        results_tx,
        results_rx,
        error_tx,
        error_rx,
    }
}

/// Handles returned by [`run_pipeline`](super::run_pipeline): drain `results_rx`, then
/// join the threads and read `error_rx`.
pub struct PipelineHandles {
    /// Pages handed to the run; a complete run collects exactly this many.
    pub supplied: usize,
    pub results_rx: Receiver<Page>,
    pub error_rx: Receiver<StageError>,
    pub source_handle: JoinHandle<usize>,
    pub worker_handles: Vec<JoinHandle<()>>,
    pub signals: RunSignals,
    pub error_policy: ErrorPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::select;
    use std::time::Duration;

    #[test]
    fn test_cancel_is_idempotent_and_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_signal_ready_only_after_cancel() {
        let token = CancelToken::new();
        assert!(
            token
                .signal()
                .recv_timeout(Duration::from_millis(10))
                .is_err()
        );
        token.cancel();
        let fired = select! {
            recv(token.signal()) -> _ => true,
            default(Duration::from_secs(1)) => false,
        };
        assert!(fired);
    }

    #[test]
    fn test_run_signals_abort_does_not_touch_user_token() {
        let user = CancelToken::new();
        let signals = RunSignals::new(user.clone());
        signals.abort.cancel();
        assert!(signals.is_set());
        assert!(!user.is_cancelled());
    }
}
