//! Source loop: feed pages, in order, onto the supply channel until done or stopped.

use crossbeam_channel::{Sender, select};
use log::debug;
use std::thread::{self, JoinHandle};

use crate::types::Page;

use super::context::RunSignals;

pub fn spawn_source_thread(
    pages: Vec<Page>,
    supply_tx: Sender<Page>,
    signals: RunSignals,
) -> JoinHandle<usize> {
    thread::spawn(move || run_source_loop(pages, supply_tx, &signals))
}

/// Send each page on `supply_tx` in ascending order. Stops early when a stop signal fires
/// or every worker has hung up. Drops `supply_tx` on return so workers see the channel
/// close. Returns the number of pages handed to workers.
pub fn run_source_loop(pages: Vec<Page>, supply_tx: Sender<Page>, signals: &RunSignals) -> usize {
    let mut sent = 0_usize;
    for page in pages {
        if signals.is_set() {
            break;
        }
        let number = page.number;
        select! {
            send(supply_tx, page) -> res => {
                if res.is_err() {
                    break;
                }
                sent += 1;
            }
            recv(signals.user.signal()) -> _ => {
                debug!("source: cancelled before page {}", number);
                break;
            }
            recv(signals.abort.signal()) -> _ => {
                debug!("source: aborted before page {}", number);
                break;
            }
        }
    }
    drop(supply_tx);
    sent
}
