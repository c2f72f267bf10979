//! Profiling hook around a run: wall time and process resident memory.

use log::info;
use std::time::Instant;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Guard returned by [`RunProfile::start`]. Reports on [`RunProfile::stop`] or on drop,
/// whichever comes first. Disabled guards do nothing.
pub struct RunProfile {
    started: Option<Instant>,
    rss_at_start: Option<u64>,
}

impl RunProfile {
    pub fn start(enabled: bool) -> Self {
        if !enabled {
            return Self {
                started: None,
                rss_at_start: None,
            };
        }
        Self {
            started: Some(Instant::now()),
            rss_at_start: resident_memory(),
        }
    }

    pub fn stop(&mut self) {
        let Some(started) = self.started.take() else {
            return;
        };
        let elapsed = started.elapsed();
        match (self.rss_at_start, resident_memory()) {
            (Some(before), Some(after)) => info!(
                "profile: {:?} elapsed, rss {} -> {} ({:+} KiB)",
                elapsed,
                kib(before),
                kib(after),
                (after as i64 - before as i64) / 1024
            ),
            _ => info!("profile: {:?} elapsed", elapsed),
        }
    }
}

impl Drop for RunProfile {
    fn drop(&mut self) {
        self.stop();
    }
}

fn kib(bytes: u64) -> String {
    format!("{} KiB", bytes / 1024)
}

/// Resident memory of this process in bytes, or None when the platform does not report it.
fn resident_memory() -> Option<u64> {
    let pid: Pid = sysinfo::get_current_pid().ok()?;
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory(),
    );
    sys.process(pid).map(|p| p.memory())
}
