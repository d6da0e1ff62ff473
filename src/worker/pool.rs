//! Worker pool for Safe vanity mining.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver};
use tracing::{info, warn};

use crate::crypto::SaltNonce;
use crate::error::Result;
use crate::matcher::Pattern;

use super::cpu::{CpuWorker, WorkerStats};
use super::{SearchTarget, VanityMatch};

/// Counters sampled from a running pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub salts: u64,
    pub matches: u64,
    pub elapsed: Duration,
}

impl Progress {
    pub fn salts_per_second(&self) -> f64 {
        match self.elapsed.as_secs_f64() {
            t if t > 0.0 => self.salts as f64 / t,
            _ => 0.0,
        }
    }
}

pub struct WorkerPool {
    handles: Option<Vec<JoinHandle<()>>>,
    result_rx: Receiver<VanityMatch>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
    start_time: Instant,
}

impl WorkerPool {
    /// Spawns `num_workers` threads.
    ///
    /// With `seed`, worker `i` walks `seed + i, seed + i + n, ...` so the run is
    /// reproducible and workers never overlap. Without it every worker starts
    /// from its own random 256-bit nonce and increments.
    pub fn new(
        num_workers: usize,
        pattern: Pattern,
        target: SearchTarget,
        seed: Option<SaltNonce>,
    ) -> Result<Self> {
        let num_workers = num_workers.max(1);
        let (result_tx, result_rx) = bounded(100);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(WorkerStats::new());

        let (stride, starts): (u64, Vec<SaltNonce>) = match seed {
            Some(seed) => (
                num_workers as u64,
                (0..num_workers)
                    .map(|i| seed.wrapping_add_u64(i as u64))
                    .collect(),
            ),
            None => (1, (0..num_workers).map(|_| SaltNonce::random()).collect()),
        };

        let mut handles = Vec::with_capacity(num_workers);
        for (id, start) in starts.into_iter().enumerate() {
            let worker = CpuWorker::new(
                id,
                pattern.clone(),
                target,
                start,
                stride,
                result_tx.clone(),
                stop_flag.clone(),
                stats.clone(),
            );
            let spawned = thread::Builder::new()
                .name(format!("safe-vanity-worker-{}", id))
                .spawn(move || worker.run());
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    stop_flag.store(true, Ordering::Relaxed);
                    drain_and_join(handles, &result_rx);
                    return Err(e.into());
                }
            }
        }

        drop(result_tx);
        info!(workers = num_workers, %pattern, stride, "search started");

        Ok(Self {
            handles: Some(handles),
            result_rx,
            stop_flag,
            stats,
            start_time: Instant::now(),
        })
    }

    pub fn wait_for_result(&self, timeout: Duration) -> Option<VanityMatch> {
        self.result_rx.recv_timeout(timeout).ok()
    }

    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }

    /// Shared with the Ctrl-C handler.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    pub fn progress(&self) -> Progress {
        Progress {
            salts: self.stats.total_salts(),
            matches: self.stats.total_matches(),
            elapsed: self.start_time.elapsed(),
        }
    }

    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop();
        if let Some(handles) = self.handles.take() {
            drain_and_join(handles, &self.result_rx);
        }
    }
}

/// Joins every worker, draining results meanwhile so a worker blocked on a
/// full channel can still exit.
fn drain_and_join(handles: Vec<JoinHandle<()>>, result_rx: &Receiver<VanityMatch>) {
    for handle in handles {
        while !handle.is_finished() {
            result_rx.try_iter().for_each(drop);
            thread::sleep(Duration::from_millis(1));
        }
        if handle.join().is_err() {
            warn!("worker thread panicked");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
