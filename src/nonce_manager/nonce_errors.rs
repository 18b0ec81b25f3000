use crate::rpc_manager::RpcManagerError;
use alloy::primitives::Address;
use thiserror::Error;

/// Nonce Manager specific errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NonceError {
    /// Reading the pending transaction count failed
    #[error("Failed to read pending nonce for {address}: {source}")]
    Sync {
        address: Address,
        #[source]
        source: RpcManagerError,
    },

    /// The counter sits at `u64::MAX` and cannot hand out another nonce
    #[error("Nonce space exhausted for {address}")]
    Exhausted { address: Address },
}

/// Result type for nonce operations
pub type NonceResult<T> = Result<T, NonceError>;
