//! RPC Manager Module
//!
//! Chain access behind a narrow trait, the alloy-backed implementation, and
//! the broadcast/confirmation stage built on top of it.

use crate::types::Receipt;
use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;

// Submodules
pub mod alloy_rpc;
pub mod broadcaster;
pub mod rpc_errors;

// Re-exports for convenience
pub use alloy_rpc::AlloyRpc;
pub use broadcaster::{Broadcaster, BroadcasterConfig};
pub use rpc_errors::{RpcManagerError, RpcResult};

/// Everything the launch pipeline needs from a chain node
#[async_trait]
pub trait ChainRpc: Send + Sync + std::fmt::Debug {
    /// Transaction count of `address` including pending transactions
    async fn pending_nonce(&self, address: Address) -> RpcResult<u64>;

    /// Current gas price estimate in wei
    async fn gas_price(&self) -> RpcResult<u128>;

    /// Submit an EIP-2718 encoded signed transaction
    async fn send_raw_transaction(&self, raw: &[u8]) -> RpcResult<TxHash>;

    /// Receipt for a mined transaction, `None` while still pending
    async fn transaction_receipt(&self, tx_hash: TxHash) -> RpcResult<Option<Receipt>>;
}
