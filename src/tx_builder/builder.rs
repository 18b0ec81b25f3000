//! Core transaction assembly for factory launches
//!
//! Assembly itself is pure; the only I/O here is the gas-price read, which
//! is delegated to the chain RPC.

use super::contract::launchTokenCall;
use crate::metrics::metrics;
use crate::rpc_manager::{ChainRpc, RpcResult};
use crate::types::{LaunchRequest, UnsignedTransaction};
use alloy::primitives::{Address, Bytes};
use alloy::sol_types::SolCall;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Fixed per-process chain parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParams {
    pub chain_id: u64,
    /// Factory contract receiving `launchToken`
    pub factory: Address,
    /// Gas limit ceiling for every launch
    pub gas_limit: u64,
}

/// ABI-encode `launchToken(name, symbol, supply × 10^18)`
pub fn encode_launch_call(request: &LaunchRequest) -> Bytes {
    launchTokenCall {
        name: request.name().to_string(),
        symbol: request.symbol().to_string(),
        supply: request.supply_onchain(),
    }
    .abi_encode()
    .into()
}

/// Assemble the unsigned launch transaction
pub fn build_launch_transaction(
    request: &LaunchRequest,
    nonce: u64,
    params: &ChainParams,
    gas_price: u128,
) -> UnsignedTransaction {
    UnsignedTransaction {
        to: params.factory,
        data: encode_launch_call(request),
        chain_id: params.chain_id,
        gas_limit: params.gas_limit,
        gas_price,
        nonce,
    }
}

/// Builds launch transactions against one factory
#[derive(Debug, Clone)]
pub struct TxBuilder {
    rpc: Arc<dyn ChainRpc>,
    params: ChainParams,
}

impl TxBuilder {
    pub fn new(rpc: Arc<dyn ChainRpc>, params: ChainParams) -> Self {
        Self { rpc, params }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Current gas price estimate from the node
    pub async fn current_gas_price(&self) -> RpcResult<u128> {
        let gas_price = self.rpc.gas_price().await?;
        debug!(gas_price, "Gas price read");
        Ok(gas_price)
    }

    pub fn build(&self, request: &LaunchRequest, nonce: u64, gas_price: u128) -> UnsignedTransaction {
        let started = Instant::now();
        let tx = build_launch_transaction(request, nonce, &self.params, gas_price);
        metrics().build_latency.observe(started.elapsed().as_secs_f64());
        tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_chain_params, MockChainRpc};
    use alloy::primitives::U256;

    #[test]
    fn test_reference_request_encodes_scaled_supply() {
        let request = LaunchRequest::new("Cool Ape", "CAPE", U256::from(1_000_000_000u64)).unwrap();
        let params = test_chain_params();
        let tx = build_launch_transaction(&request, 7, &params, 1_000_000_000);

        assert_eq!(tx.to, params.factory);
        assert_eq!(tx.chain_id, 8453);
        assert_eq!(tx.gas_limit, 6_000_000);
        assert_eq!(tx.gas_price, 1_000_000_000);
        assert_eq!(tx.nonce, 7);

        assert_eq!(&tx.data[..4], launchTokenCall::SELECTOR.as_slice());
        let call = launchTokenCall::abi_decode(&tx.data).unwrap();
        assert_eq!(call.name, "Cool Ape");
        assert_eq!(call.symbol, "CAPE");
        assert_eq!(
            call.supply,
            U256::from(1_000_000_000u64) * U256::from(10u64).pow(U256::from(18u64))
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let request = LaunchRequest::new("Name", "SYMB", U256::from(1000u64)).unwrap();
        let params = test_chain_params();
        assert_eq!(
            build_launch_transaction(&request, 1, &params, 5),
            build_launch_transaction(&request, 1, &params, 5)
        );
    }

    #[tokio::test]
    async fn test_builder_reads_gas_price_from_rpc() {
        let rpc = Arc::new(MockChainRpc::new().with_gas_price(42_000_000));
        let builder = TxBuilder::new(rpc.clone(), test_chain_params());
        let gas_price = builder.current_gas_price().await.unwrap();
        assert_eq!(gas_price, 42_000_000);

        let request = LaunchRequest::new("Name", "SYMB", U256::from(1u64)).unwrap();
        let tx = builder.build(&request, 0, gas_price);
        assert_eq!(tx.gas_price, 42_000_000);
    }
}
