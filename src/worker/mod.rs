//! Worker pool and CPU worker for Safe vanity mining.

mod cpu;
mod pool;

use serde::Serialize;

use crate::crypto::{Address, SaltNonce};

pub use cpu::{CpuWorker, SearchOutcome, Searcher, WorkerStats, BATCH_SIZE};
pub use pool::{Progress, WorkerPool};

/// Inputs that stay fixed for the whole search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTarget {
    pub factory: [u8; 20],
    pub init_code_hash: [u8; 32],
    pub initializer_hash: [u8; 32],
}

/// Result of a successful Safe vanity match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VanityMatch {
    /// Pass to SafeProxyFactory.createProxyWithNonce.
    pub salt_nonce: SaltNonce,
    pub address: Address,
    pub worker_id: usize,
}

impl VanityMatch {
    /// Salt nonce as hex (no 0x).
    pub fn salt_nonce_hex(&self) -> String {
        self.salt_nonce.to_hex()
    }

    /// Salt nonce as decimal string (for Safe SDK `safeDeploymentConfig.saltNonce`).
    pub fn salt_nonce_decimal(&self) -> String {
        self.salt_nonce.to_decimal()
    }

    pub fn address_checksum(&self) -> String {
        self.address.to_checksum()
    }
}
