//! CPU worker for Safe vanity address mining.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::{debug, info};

use crate::crypto::create2::{safe_address, safe_salt};
use crate::crypto::{Address, SaltNonce};
use crate::matcher::Pattern;

use super::{SearchTarget, VanityMatch};

/// Candidates tried between cancel-flag checks and stats updates.
pub const BATCH_SIZE: u64 = 1000;

#[derive(Debug, Default)]
pub struct WorkerStats {
    pub salts_tried: AtomicU64,
    pub matches_found: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn total_salts(&self) -> u64 {
        self.salts_tried.load(Ordering::Relaxed)
    }
    pub fn total_matches(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }
}

/// Single-threaded search over `start, start + stride, start + 2 * stride, ...`.
pub struct Searcher {
    pattern: Pattern,
    target: SearchTarget,
}

/// Why `Searcher::search` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A match; `next` is where to resume.
    Found {
        salt_nonce: SaltNonce,
        address: Address,
        next: SaltNonce,
    },
    Exhausted { next: SaltNonce },
    Cancelled { next: SaltNonce },
}

impl Searcher {
    pub fn new(pattern: Pattern, target: SearchTarget) -> Self {
        Self { pattern, target }
    }

    /// Address produced by one seed.
    #[inline]
    pub fn address_for(&self, salt_nonce: &SaltNonce) -> Address {
        let salt = safe_salt(&self.target.initializer_hash, salt_nonce.as_bytes());
        Address(safe_address(
            &self.target.factory,
            &self.target.init_code_hash,
            &salt,
        ))
    }

    /// Tries up to `max_attempts` seeds (`None` = unbounded). `cancel` is polled
    /// every `BATCH_SIZE` candidates and `on_batch` receives the attempts made
    /// since the previous call.
    pub fn search(
        &self,
        start: SaltNonce,
        stride: u64,
        max_attempts: Option<u64>,
        cancel: &AtomicBool,
        mut on_batch: impl FnMut(u64),
    ) -> SearchOutcome {
        let mut salt_nonce = start;
        let mut attempts: u64 = 0;
        let mut pending: u64 = 0;

        loop {
            if cancel.load(Ordering::Relaxed) {
                on_batch(pending);
                return SearchOutcome::Cancelled { next: salt_nonce };
            }

            for _ in 0..BATCH_SIZE {
                if max_attempts.is_some_and(|max| attempts >= max) {
                    on_batch(pending);
                    return SearchOutcome::Exhausted { next: salt_nonce };
                }

                let address = self.address_for(&salt_nonce);
                let current = salt_nonce;
                if stride == 1 {
                    salt_nonce.increment();
                } else {
                    salt_nonce = salt_nonce.wrapping_add_u64(stride);
                }
                attempts += 1;
                pending += 1;

                if self.pattern.is_match(&address) {
                    on_batch(pending);
                    return SearchOutcome::Found {
                        salt_nonce: current,
                        address,
                        next: salt_nonce,
                    };
                }
            }

            on_batch(pending);
            pending = 0;
        }
    }
}

pub struct CpuWorker {
    id: usize,
    searcher: Searcher,
    start: SaltNonce,
    stride: u64,
    result_tx: Sender<VanityMatch>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
}

impl CpuWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        pattern: Pattern,
        target: SearchTarget,
        start: SaltNonce,
        stride: u64,
        result_tx: Sender<VanityMatch>,
        stop_flag: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            searcher: Searcher::new(pattern, target),
            start,
            stride,
            result_tx,
            stop_flag,
            stats,
        }
    }

    /// Runs until the stop flag is set or the result channel closes.
    pub fn run(&self) {
        debug!(worker = self.id, start = %self.start, stride = self.stride, "worker started");
        let mut next = self.start;

        loop {
            let outcome = self.searcher.search(next, self.stride, None, &self.stop_flag, |n| {
                self.stats.salts_tried.fetch_add(n, Ordering::Relaxed);
            });

            match outcome {
                SearchOutcome::Found {
                    salt_nonce,
                    address,
                    next: resume,
                } => {
                    self.stats.matches_found.fetch_add(1, Ordering::Relaxed);
                    info!(worker = self.id, %address, %salt_nonce, "match found");
                    let result = VanityMatch {
                        salt_nonce,
                        address,
                        worker_id: self.id,
                    };
                    if self.result_tx.send(result).is_err() {
                        break;
                    }
                    next = resume;
                }
                SearchOutcome::Cancelled { .. } | SearchOutcome::Exhausted { .. } => break,
            }
        }

        debug!(worker = self.id, "worker stopped");
    }
}
