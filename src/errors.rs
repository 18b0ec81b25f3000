//! Error taxonomy for the launch pipeline
//!
//! Every stage returns a `LaunchError`; the variant decides how the failure is
//! reported and whether an operator needs to look at it. Failures never roll
//! back the nonce counter.

use alloy::primitives::TxHash;
use std::fmt;
use thiserror::Error;

/// Flat classification of a failed launch, used for metrics labels and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedRequest,
    InvalidSupply,
    SigningError,
    BroadcastError,
    ConfirmationTimeout,
    TransactionReverted,
    EventNotFound,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedRequest => "malformed_request",
            ErrorKind::InvalidSupply => "invalid_supply",
            ErrorKind::SigningError => "signing_error",
            ErrorKind::BroadcastError => "broadcast_error",
            ErrorKind::ConfirmationTimeout => "confirmation_timeout",
            ErrorKind::TransactionReverted => "transaction_reverted",
            ErrorKind::EventNotFound => "event_not_found",
        }
    }

    /// Whether the failure points at a configuration fault or an on-chain
    /// anomaly rather than at the request itself
    pub fn needs_operator(&self) -> bool {
        matches!(self, ErrorKind::SigningError | ErrorKind::EventNotFound)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a single launch request
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LaunchError {
    /// Text is not a `Name|Symbol|Supply` triple with non-empty name and symbol
    #[error("Malformed request: {reason}")]
    MalformedRequest { reason: String },

    /// Third field is not a non-negative base-10 integer (or overflows 256 bits
    /// once scaled to 18 decimals)
    #[error("Invalid supply: {input:?}")]
    InvalidSupply { input: String },

    /// The signer rejected the payload. Indicates a configuration fault.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The transaction never made it into the node's pool.
    ///
    /// `tx_hash` is the locally computed hash when a signed transaction
    /// existed at the time of failure. `rejected` is set only when the node
    /// answered and refused it, so it is in no mempool.
    #[error("Broadcast failed: {message}")]
    Broadcast {
        message: String,
        tx_hash: Option<TxHash>,
        rejected: bool,
    },

    /// Sent, but no receipt within the confirmation window. The transaction
    /// may still be mined later.
    #[error("Confirmation timed out after {waited_secs}s (tx: {tx_hash})")]
    ConfirmationTimeout { tx_hash: TxHash, waited_secs: u64 },

    /// Mined with a failed status
    #[error("Transaction reverted (tx: {tx_hash})")]
    TransactionReverted { tx_hash: TxHash },

    /// Mined successfully but the factory emitted no launch event
    #[error("Launch event missing from successful receipt (tx: {tx_hash})")]
    EventNotFound { tx_hash: TxHash },
}

impl LaunchError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        LaunchError::MalformedRequest {
            reason: reason.into(),
        }
    }

    /// Build a broadcast failure, bounding the underlying RPC message
    pub fn broadcast(
        source: impl fmt::Display,
        tx_hash: Option<TxHash>,
        max_len: usize,
    ) -> Self {
        LaunchError::Broadcast {
            message: truncate_message(&source.to_string(), max_len),
            tx_hash,
            rejected: false,
        }
    }

    /// Broadcast failure where the node explicitly refused the transaction
    pub fn rejected(source: impl fmt::Display, tx_hash: TxHash, max_len: usize) -> Self {
        LaunchError::Broadcast {
            message: truncate_message(&source.to_string(), max_len),
            tx_hash: Some(tx_hash),
            rejected: true,
        }
    }

    /// The reserved nonce is known to be unused on chain: the transaction was
    /// never signed, or the node refused it
    pub fn strands_nonce(&self) -> bool {
        matches!(
            self,
            LaunchError::Signing(_) | LaunchError::Broadcast { rejected: true, .. }
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LaunchError::MalformedRequest { .. } => ErrorKind::MalformedRequest,
            LaunchError::InvalidSupply { .. } => ErrorKind::InvalidSupply,
            LaunchError::Signing(_) => ErrorKind::SigningError,
            LaunchError::Broadcast { .. } => ErrorKind::BroadcastError,
            LaunchError::ConfirmationTimeout { .. } => ErrorKind::ConfirmationTimeout,
            LaunchError::TransactionReverted { .. } => ErrorKind::TransactionReverted,
            LaunchError::EventNotFound { .. } => ErrorKind::EventNotFound,
        }
    }

    /// Transaction hash an operator can look up on an explorer, if any
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            LaunchError::Broadcast { tx_hash, .. } => *tx_hash,
            LaunchError::ConfirmationTimeout { tx_hash, .. }
            | LaunchError::TransactionReverted { tx_hash }
            | LaunchError::EventNotFound { tx_hash } => Some(*tx_hash),
            _ => None,
        }
    }
}

/// Truncate to at most `max_chars` characters, never splitting a code point
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => message[..byte_idx].to_string(),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_message_bounds() {
        assert_eq!(truncate_message("short", 500), "short");
        assert_eq!(truncate_message("abcdef", 3), "abc");
        assert_eq!(truncate_message("", 3), "");
        // Multi-byte characters count as one
        assert_eq!(truncate_message("ééééé", 2), "éé");
    }

    #[test]
    fn test_broadcast_error_truncates() {
        let long = "x".repeat(2_000);
        let err = LaunchError::broadcast(long, None, 500);
        match err {
            LaunchError::Broadcast {
                message,
                tx_hash,
                rejected,
            } => {
                assert_eq!(message.len(), 500);
                assert!(tx_hash.is_none());
                assert!(!rejected);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_tx_hash_retained_where_known() {
        let hash = TxHash::repeat_byte(0x11);
        assert_eq!(
            LaunchError::ConfirmationTimeout {
                tx_hash: hash,
                waited_secs: 200
            }
            .tx_hash(),
            Some(hash)
        );
        assert_eq!(
            LaunchError::TransactionReverted { tx_hash: hash }.tx_hash(),
            Some(hash)
        );
        assert_eq!(LaunchError::EventNotFound { tx_hash: hash }.tx_hash(), Some(hash));
        assert_eq!(LaunchError::malformed("x").tx_hash(), None);
        assert_eq!(LaunchError::Signing("bad".into()).tx_hash(), None);
    }

    #[test]
    fn test_only_unsent_transactions_strand_the_nonce() {
        let hash = TxHash::repeat_byte(0x33);
        assert!(LaunchError::Signing("gas limit is zero".into()).strands_nonce());
        assert!(LaunchError::rejected("nonce too low", hash, 500).strands_nonce());
        assert!(!LaunchError::broadcast("send timed out", Some(hash), 500).strands_nonce());
        assert!(!LaunchError::ConfirmationTimeout {
            tx_hash: hash,
            waited_secs: 200
        }
        .strands_nonce());
    }

    #[test]
    fn test_kind_classification() {
        assert!(ErrorKind::SigningError.needs_operator());
        assert!(ErrorKind::EventNotFound.needs_operator());
        assert!(!ErrorKind::TransactionReverted.needs_operator());
        assert_eq!(ErrorKind::ConfirmationTimeout.to_string(), "confirmation_timeout");
    }
}
