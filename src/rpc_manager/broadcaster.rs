//! Broadcast and confirmation stage
//!
//! Sending and waiting are separate steps so the launch engine can release
//! the nonce sequencer as soon as the node has accepted the transaction,
//! and only then start the (long) receipt wait.

use super::rpc_errors::RpcManagerError;
use super::ChainRpc;
use crate::errors::LaunchError;
use crate::metrics::metrics;
use crate::types::{Receipt, SignedTransaction};
use alloy::primitives::TxHash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Timing and reporting knobs for the broadcast stage
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Upper bound for the send call itself
    pub send_timeout: Duration,
    /// How long to wait for a receipt before giving up
    pub confirmation_timeout: Duration,
    /// Delay between receipt polls
    pub poll_interval: Duration,
    /// Maximum characters of an RPC error carried into a `BroadcastError`
    pub max_error_len: usize,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(30),
            confirmation_timeout: Duration::from_secs(200),
            poll_interval: Duration::from_secs(1),
            max_error_len: 500,
        }
    }
}

/// Submits signed transactions and waits for their receipts
#[derive(Debug, Clone)]
pub struct Broadcaster {
    rpc: Arc<dyn ChainRpc>,
    config: BroadcasterConfig,
}

impl Broadcaster {
    pub fn new(rpc: Arc<dyn ChainRpc>, config: BroadcasterConfig) -> Self {
        Self { rpc, config }
    }

    pub fn config(&self) -> &BroadcasterConfig {
        &self.config
    }

    /// Send then wait for inclusion
    pub async fn submit(&self, signed: SignedTransaction) -> Result<Receipt, LaunchError> {
        let tx_hash = self.send(signed).await?;
        self.wait_for_receipt(tx_hash).await
    }

    /// Hand the raw transaction to the node and return its hash.
    ///
    /// Fails with `BroadcastError` before any confirmation wait starts. A node
    /// answering "already known" means the transaction is in its pool, which
    /// counts as sent.
    pub async fn send(&self, signed: SignedTransaction) -> Result<TxHash, LaunchError> {
        let local_hash = signed.tx_hash();
        let nonce = signed.nonce();
        metrics().broadcasts_total.inc();

        let sent = tokio::time::timeout(
            self.config.send_timeout,
            self.rpc.send_raw_transaction(signed.raw()),
        )
        .await;

        match sent {
            Ok(Ok(tx_hash)) => {
                if tx_hash != local_hash {
                    warn!(
                        %tx_hash,
                        %local_hash,
                        "Node returned a different hash than computed locally"
                    );
                }
                info!(%tx_hash, nonce, "Transaction broadcast");
                Ok(tx_hash)
            }
            Ok(Err(RpcManagerError::AlreadyKnown { .. })) => {
                info!(tx_hash = %local_hash, nonce, "Transaction already in node pool");
                Ok(local_hash)
            }
            Ok(Err(err)) if err.rejected_by_node() => {
                warn!(
                    tx_hash = %local_hash,
                    nonce,
                    error = %err,
                    "Node rejected transaction"
                );
                Err(LaunchError::rejected(err, local_hash, self.config.max_error_len))
            }
            Ok(Err(err)) => {
                warn!(
                    tx_hash = %local_hash,
                    nonce,
                    error = %err,
                    "Broadcast failed; transaction may or may not have reached the network"
                );
                Err(LaunchError::broadcast(err, Some(local_hash), self.config.max_error_len))
            }
            Err(_) => {
                warn!(
                    tx_hash = %local_hash,
                    nonce,
                    timeout_ms = self.config.send_timeout.as_millis() as u64,
                    "Broadcast timed out; transaction may still reach the network"
                );
                Err(LaunchError::broadcast(
                    format!(
                        "send timed out after {}s; transaction may still reach the network",
                        self.config.send_timeout.as_secs()
                    ),
                    Some(local_hash),
                    self.config.max_error_len,
                ))
            }
        }
    }

    /// Poll for the receipt until mined or the confirmation window closes.
    ///
    /// Timing out does not cancel anything on chain; the hash travels with the
    /// error so the transaction can be looked up later.
    pub async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<Receipt, LaunchError> {
        let started = Instant::now();
        let timeout = self.config.confirmation_timeout;

        let polled = tokio::time::timeout(timeout, self.poll_receipt(tx_hash)).await;

        match polled {
            Ok(receipt) => {
                let waited = started.elapsed();
                metrics().confirmation_latency.observe(waited.as_secs_f64());
                info!(
                    %tx_hash,
                    block = ?receipt.block_number,
                    status = ?receipt.status,
                    waited_ms = waited.as_millis() as u64,
                    "Transaction mined"
                );
                Ok(receipt)
            }
            Err(_) => {
                warn!(
                    %tx_hash,
                    timeout_secs = timeout.as_secs(),
                    "No receipt within confirmation window"
                );
                Err(LaunchError::ConfirmationTimeout {
                    tx_hash,
                    waited_secs: timeout.as_secs(),
                })
            }
        }
    }

    async fn poll_receipt(&self, tx_hash: TxHash) -> Receipt {
        let mut attempts: u64 = 0;
        loop {
            attempts += 1;
            match self.rpc.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return receipt,
                Ok(None) => {
                    debug!(%tx_hash, attempts, "Receipt not available yet");
                }
                Err(err) => {
                    warn!(%tx_hash, attempts, error = %err, "Receipt poll failed; will keep polling");
                }
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}
