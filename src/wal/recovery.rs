//! WAL Recovery
//!
//! Replays a log after a restart, skipping transactions that cannot be
//! read instead of abandoning the rest of the log.

use tracing::{info, warn};

use crate::error::Result;
use crate::view::ByteView;

use super::WalReader;

/// Handles WAL replay after a restart
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of transactions successfully replayed
    pub transactions_recovered: u64,

    /// Number of malformed transactions skipped
    pub transactions_corrupted: u64,

    /// Length of the log that was scanned
    pub log_length: u64,
}

impl WalRecovery {
    /// Feed every readable transaction of `log` to `apply`, in order
    ///
    /// Transactions the log cannot reconstruct are counted and skipped.
    /// An error returned by `apply` aborts the replay.
    pub fn replay<F>(log: ByteView, mut apply: F) -> Result<RecoveryResult>
    where
        F: FnMut(ByteView) -> Result<()>,
    {
        let mut result = RecoveryResult {
            log_length: log.len() as u64,
            ..Default::default()
        };

        for transaction in WalReader::new(log).transactions() {
            match transaction {
                Ok(bytes) => {
                    apply(bytes)?;
                    result.transactions_recovered += 1;
                }
                Err(e) => {
                    warn!(error = %e, "dropping unreadable log transaction");
                    result.transactions_corrupted += 1;
                }
            }
        }

        info!(
            recovered = result.transactions_recovered,
            corrupted = result.transactions_corrupted,
            bytes = result.log_length,
            "log replay complete"
        );
        Ok(result)
    }

    /// Collect the readable transactions of `log`
    pub fn recover(log: ByteView) -> (Vec<ByteView>, RecoveryResult) {
        let mut transactions = Vec::new();
        let mut result = RecoveryResult {
            log_length: log.len() as u64,
            ..Default::default()
        };
        for transaction in WalReader::new(log).transactions() {
            match transaction {
                Ok(bytes) => {
                    transactions.push(bytes);
                    result.transactions_recovered += 1;
                }
                Err(_) => result.transactions_corrupted += 1,
            }
        }
        (transactions, result)
    }

    /// Check a log without applying it
    pub fn verify(log: ByteView) -> RecoveryResult {
        Self::recover(log).1
    }
}
