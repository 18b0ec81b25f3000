//! JSON-RPC chain access backed by an alloy provider
//!
//! Every call is bounded by a request timeout and its error is classified
//! into [`RpcManagerError`] so callers never see transport internals.

use super::rpc_errors::{RpcManagerError, RpcResult};
use super::ChainRpc;
use crate::types::{EventLog, Receipt, ReceiptStatus};
use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use alloy::transports::TransportError;
use async_trait::async_trait;
use std::future::IntoFuture;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// [`ChainRpc`] over any alloy provider
pub struct AlloyRpc<P> {
    provider: P,
    endpoint: String,
    request_timeout: Duration,
}

impl<P> std::fmt::Debug for AlloyRpc<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloyRpc")
            .field("endpoint", &self.endpoint)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// Connect to an HTTP JSON-RPC endpoint
pub fn connect_http(
    url: &str,
    request_timeout: Duration,
) -> RpcResult<AlloyRpc<impl Provider + 'static>> {
    let parsed: reqwest::Url = url
        .parse()
        .map_err(|e| RpcManagerError::Transport {
            endpoint: url.to_string(),
            message: format!("invalid RPC url: {}", e),
        })?;

    let provider = ProviderBuilder::new().connect_http(parsed);
    Ok(AlloyRpc::new(provider, url, request_timeout))
}

impl<P: Provider> AlloyRpc<P> {
    pub fn new(provider: P, endpoint: &str, request_timeout: Duration) -> Self {
        Self {
            provider,
            endpoint: endpoint.to_string(),
            request_timeout,
        }
    }

    fn classify(&self, err: TransportError) -> RpcManagerError {
        match err.as_error_resp() {
            Some(payload) => RpcManagerError::from_error_response(
                &self.endpoint,
                &payload.message,
                Some(payload.code),
            ),
            None => RpcManagerError::from_transport_message(&self.endpoint, &err.to_string()),
        }
    }

    /// Run one RPC call under the request timeout
    async fn timed<T, F>(&self, method: &'static str, call: F) -> RpcResult<T>
    where
        F: IntoFuture<Output = Result<T, TransportError>>,
    {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(self.classify(err)),
            Err(_) => Err(RpcManagerError::Timeout {
                endpoint: self.endpoint.clone(),
                timeout_ms: self.request_timeout.as_millis() as u64,
            }),
        };

        debug!(
            method,
            latency_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "RPC call finished"
        );
        result
    }
}

fn convert_receipt(receipt: TransactionReceipt) -> Receipt {
    let status = if ReceiptResponse::status(&receipt) {
        ReceiptStatus::Success
    } else {
        ReceiptStatus::Reverted
    };

    let logs = receipt
        .inner
        .logs()
        .iter()
        .map(|log| EventLog {
            address: log.inner.address,
            data: log.inner.data.clone(),
        })
        .collect();

    Receipt {
        tx_hash: receipt.transaction_hash,
        status,
        block_number: receipt.block_number,
        logs,
    }
}

#[async_trait]
impl<P: Provider + 'static> ChainRpc for AlloyRpc<P> {
    #[instrument(skip(self), level = "debug")]
    async fn pending_nonce(&self, address: Address) -> RpcResult<u64> {
        self.timed(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address).pending(),
        )
        .await
    }

    async fn gas_price(&self) -> RpcResult<u128> {
        self.timed("eth_gasPrice", self.provider.get_gas_price()).await
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> RpcResult<TxHash> {
        let pending = self
            .timed(
                "eth_sendRawTransaction",
                self.provider.send_raw_transaction(raw),
            )
            .await?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> RpcResult<Option<Receipt>> {
        let receipt = self
            .timed(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(tx_hash),
            )
            .await?;
        Ok(receipt.map(convert_receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_http_rejects_bad_url() {
        let err = connect_http("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, RpcManagerError::Transport { .. }));
    }

    #[test]
    fn test_connect_http_accepts_valid_url() {
        let rpc = connect_http("https://mainnet.base.org", Duration::from_secs(1)).unwrap();
        let debug = format!("{:?}", rpc);
        assert!(debug.contains("mainnet.base.org"));
    }
}
