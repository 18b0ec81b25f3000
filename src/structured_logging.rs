//! Structured logging and launch context

use crate::errors::LaunchError;
use alloy::primitives::{Address, TxHash};
use std::time::Instant;
use uuid::Uuid;

/// Structured logger for pipeline events
#[derive(Debug, Clone)]
pub struct LaunchLogger {
    launch_id: String,
}

impl LaunchLogger {
    pub fn new(launch_id: String) -> Self {
        Self { launch_id }
    }

    pub fn launch_id(&self) -> &str {
        &self.launch_id
    }

    pub fn log_request_accepted(&self, name: &str, symbol: &str, supply: &str) {
        tracing::info!(
            launch_id = %self.launch_id,
            name = %name,
            symbol = %symbol,
            supply = %supply,
            "Launch request accepted"
        );
    }

    pub fn log_nonce_reserved(&self, nonce: u64, gas_price: u128) {
        tracing::debug!(
            launch_id = %self.launch_id,
            nonce = %nonce,
            gas_price = %gas_price,
            "Nonce reserved"
        );
    }

    pub fn log_broadcast(&self, nonce: u64, tx_hash: &TxHash) {
        tracing::info!(
            launch_id = %self.launch_id,
            nonce = %nonce,
            tx_hash = %tx_hash,
            "Launch transaction sent"
        );
    }

    /// Operator-facing: a reserved nonce did not reach the node's pool
    pub fn log_nonce_stranded(&self, nonce: u64, error: &LaunchError) {
        tracing::warn!(
            launch_id = %self.launch_id,
            nonce = %nonce,
            error_kind = %error.kind(),
            error = %error,
            "Nonce stranded; later launches will queue behind it until re-sync"
        );
    }

    pub fn log_launch_success(&self, token: &Address, tx_hash: &TxHash, latency_ms: u64) {
        tracing::info!(
            launch_id = %self.launch_id,
            token = %token,
            tx_hash = %tx_hash,
            latency_ms = %latency_ms,
            "Token launched"
        );
    }

    pub fn log_launch_failure(&self, error: &LaunchError, latency_ms: u64) {
        let tx_hash = error.tx_hash().map(|h| h.to_string());
        if error.kind().needs_operator() {
            tracing::error!(
                launch_id = %self.launch_id,
                error_kind = %error.kind(),
                tx_hash = ?tx_hash,
                error = %error,
                latency_ms = %latency_ms,
                "Launch failed; operator attention needed"
            );
        } else {
            tracing::warn!(
                launch_id = %self.launch_id,
                error_kind = %error.kind(),
                tx_hash = ?tx_hash,
                error = %error,
                latency_ms = %latency_ms,
                "Launch failed"
            );
        }
    }
}

/// Per-launch context: id and start time
#[derive(Debug, Clone)]
pub struct LaunchContext {
    /// Unique launch ID
    pub launch_id: String,

    /// Chat the request came from, when it came from chat
    pub chat_id: Option<i64>,

    pub started: Instant,

    pub logger: LaunchLogger,
}

impl LaunchContext {
    pub fn new() -> Self {
        let launch_id = Uuid::new_v4().to_string();
        Self {
            launch_id: launch_id.clone(),
            chat_id: None,
            started: Instant::now(),
            logger: LaunchLogger::new(launch_id),
        }
    }

    pub fn for_chat(chat_id: i64) -> Self {
        Self {
            chat_id: Some(chat_id),
            ..Self::new()
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl Default for LaunchContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_get_distinct_ids() {
        let a = LaunchContext::new();
        let b = LaunchContext::for_chat(7);
        assert_ne!(a.launch_id, b.launch_id);
        assert_eq!(b.chat_id, Some(7));
        assert_eq!(b.logger.launch_id(), b.launch_id);
    }
}
