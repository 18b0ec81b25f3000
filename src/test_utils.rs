//! Test Utilities Module
//!
//! Deterministic stand-ins for the chain: a fixed signing key, canned chain
//! parameters and an in-memory [`ChainRpc`] that decodes what it is sent and
//! mines it on demand.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use crate::rpc_manager::{ChainRpc, RpcManagerError, RpcResult};
use crate::tx_builder::{build_launch_transaction, launchTokenCall, ChainParams, TokenLaunched};
use crate::types::{
    EventLog, LaunchRequest, Receipt, ReceiptStatus, SignedTransaction, UnsignedTransaction,
};
use crate::wallet::SigningAccount;
use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{address, Address, LogData, TxHash, B256, U256};
use alloy::sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use zeroize::Zeroizing;

/// Well-known development key (account 0 of the default test mnemonic)
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Address derived from [`TEST_PRIVATE_KEY`]
pub const TEST_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// Factory address used by [`test_chain_params`]
pub const TEST_FACTORY: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

/// Token address the mock factory deploys unless told otherwise
pub const TEST_TOKEN: Address = address!("abcd000000000000000000000000000000000001");

pub const TEST_GAS_PRICE: u128 = 1_000_000_000;

pub fn test_account() -> SigningAccount {
    // Constant key, cannot fail
    SigningAccount::from_hex(&Zeroizing::new(TEST_PRIVATE_KEY.to_string()))
        .expect("test key is valid")
}

pub fn test_chain_params() -> ChainParams {
    ChainParams {
        chain_id: 8453,
        factory: TEST_FACTORY,
        gas_limit: 6_000_000,
    }
}

/// The reference request: `Cool Ape|CAPE|1000000000`
pub fn test_request() -> LaunchRequest {
    LaunchRequest::new("Cool Ape", "CAPE", U256::from(1_000_000_000u64)).expect("valid request")
}

pub fn test_unsigned_transaction(nonce: u64) -> UnsignedTransaction {
    build_launch_transaction(&test_request(), nonce, &test_chain_params(), TEST_GAS_PRICE)
}

pub fn test_signed_transaction(nonce: u64) -> SignedTransaction {
    test_account()
        .sign(&test_unsigned_transaction(nonce))
        .expect("test transaction signs")
}

/// How the mock chain answers receipt polls for transactions it accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptBehavior {
    /// Answer "not yet" for the first `polls` polls of each transaction,
    /// then return a receipt with `status`. With `emit_event` the receipt
    /// carries the factory's `TokenLaunched` log.
    MineAfter {
        polls: u32,
        status: ReceiptStatus,
        emit_event: bool,
    },
    /// Never mined
    NeverMined,
}

/// A transaction the mock node accepted
#[derive(Debug, Clone)]
pub struct SentTransaction {
    pub tx_hash: TxHash,
    pub nonce: u64,
    pub call: Option<launchTokenCall>,
}

#[derive(Debug)]
struct MockState {
    pending_nonce: u64,
    nonce_error: Option<String>,
    gas_price: u128,
    gas_error: Option<String>,
    send_error: Option<String>,
    hang_sends: bool,
    send_delay: Duration,
    receipts: ReceiptBehavior,
    failing_polls: u32,
    factory: Address,
    sent: Vec<SentTransaction>,
    polls_by_tx: HashMap<TxHash, u32>,
    receipt_polls: usize,
    call_count: usize,
}

/// In-memory chain node.
///
/// Accepted transactions advance the pending nonce the way a real node's
/// pool does, so nonce re-sync can be tested against it.
#[derive(Debug)]
pub struct MockChainRpc {
    state: Mutex<MockState>,
}

impl Default for MockChainRpc {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChainRpc {
    /// Healthy node: pending nonce 0, 1 gwei gas, mines on the first poll
    /// with a launch event
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                pending_nonce: 0,
                nonce_error: None,
                gas_price: TEST_GAS_PRICE,
                gas_error: None,
                send_error: None,
                hang_sends: false,
                send_delay: Duration::ZERO,
                receipts: ReceiptBehavior::MineAfter {
                    polls: 0,
                    status: ReceiptStatus::Success,
                    emit_event: true,
                },
                failing_polls: 0,
                factory: TEST_FACTORY,
                sent: Vec::new(),
                polls_by_tx: HashMap::new(),
                receipt_polls: 0,
                call_count: 0,
            }),
        }
    }

    pub fn with_pending_nonce(self, nonce: u64) -> Self {
        self.state.lock().pending_nonce = nonce;
        self
    }

    pub fn with_gas_price(self, gas_price: u128) -> Self {
        self.state.lock().gas_price = gas_price;
        self
    }

    pub fn with_receipts(self, behavior: ReceiptBehavior) -> Self {
        self.state.lock().receipts = behavior;
        self
    }

    /// Address the fabricated launch event is emitted from
    pub fn with_factory(self, factory: Address) -> Self {
        self.state.lock().factory = factory;
        self
    }

    /// Hold every send for `delay` before answering
    pub fn with_send_delay(self, delay: Duration) -> Self {
        self.state.lock().send_delay = delay;
        self
    }

    pub fn fail_nonce_reads(&self, message: &str) {
        self.state.lock().nonce_error = Some(message.to_string());
    }

    pub fn fail_gas_price(&self, message: &str) {
        self.state.lock().gas_error = Some(message.to_string());
    }

    /// Answer every send with a JSON-RPC error carrying `message`
    pub fn fail_sends(&self, message: &str) {
        self.state.lock().send_error = Some(message.to_string());
    }

    /// Sends never complete
    pub fn hang_sends(&self) {
        self.state.lock().hang_sends = true;
    }

    /// The next `count` receipt polls fail at the transport level
    pub fn fail_receipt_polls(&self, count: u32) {
        self.state.lock().failing_polls = count;
    }

    /// Clear every injected failure
    pub fn recover(&self) {
        let mut state = self.state.lock();
        state.nonce_error = None;
        state.gas_error = None;
        state.send_error = None;
        state.hang_sends = false;
        state.failing_polls = 0;
    }

    /// Nonces of accepted transactions, in the order they arrived
    pub fn sent_nonces(&self) -> Vec<u64> {
        self.state.lock().sent.iter().map(|tx| tx.nonce).collect()
    }

    pub fn sent_transactions(&self) -> Vec<SentTransaction> {
        self.state.lock().sent.clone()
    }

    pub fn pending_nonce_now(&self) -> u64 {
        self.state.lock().pending_nonce
    }

    pub fn receipt_polls(&self) -> usize {
        self.state.lock().receipt_polls
    }

    /// Total RPC calls of any kind
    pub fn call_count(&self) -> usize {
        self.state.lock().call_count
    }

    fn launch_logs(state: &MockState, call: &launchTokenCall) -> Vec<EventLog> {
        // Unrelated log first so extraction has to filter
        let transfer = EventLog {
            address: TEST_TOKEN,
            data: LogData::new_unchecked(
                vec![B256::repeat_byte(0xdd), B256::ZERO, B256::left_padding_from(TEST_ADDRESS.as_slice())],
                call.supply.to_be_bytes_vec().into(),
            ),
        };
        let launched = EventLog {
            address: state.factory,
            data: TokenLaunched {
                token: TEST_TOKEN,
                creator: TEST_ADDRESS,
                name: call.name.clone(),
                symbol: call.symbol.clone(),
                supply: call.supply,
            }
            .encode_log_data(),
        };
        vec![transfer, launched]
    }
}

#[async_trait]
impl ChainRpc for MockChainRpc {
    async fn pending_nonce(&self, _address: Address) -> RpcResult<u64> {
        let mut state = self.state.lock();
        state.call_count += 1;
        match &state.nonce_error {
            Some(message) => Err(RpcManagerError::from_transport_message("mock", message)),
            None => Ok(state.pending_nonce),
        }
    }

    async fn gas_price(&self) -> RpcResult<u128> {
        let mut state = self.state.lock();
        state.call_count += 1;
        match &state.gas_error {
            Some(message) => Err(RpcManagerError::from_transport_message("mock", message)),
            None => Ok(state.gas_price),
        }
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> RpcResult<TxHash> {
        let (hang, delay) = {
            let mut state = self.state.lock();
            state.call_count += 1;
            (state.hang_sends, state.send_delay)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|e| RpcManagerError::from_error_response("mock", &e.to_string(), Some(-32602)))?;
        let tx_hash = *envelope.tx_hash();
        let nonce = envelope.nonce();
        let call = launchTokenCall::abi_decode(envelope.input()).ok();

        let mut state = self.state.lock();
        if let Some(message) = &state.send_error {
            return Err(RpcManagerError::from_error_response("mock", message, Some(-32000)));
        }

        state.pending_nonce = state.pending_nonce.max(nonce + 1);
        state.sent.push(SentTransaction {
            tx_hash,
            nonce,
            call,
        });
        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> RpcResult<Option<Receipt>> {
        let mut state = self.state.lock();
        state.call_count += 1;
        state.receipt_polls += 1;

        let polls = {
            let entry = state.polls_by_tx.entry(tx_hash).or_insert(0);
            *entry += 1;
            *entry
        };

        if state.failing_polls > 0 {
            state.failing_polls -= 1;
            return Err(RpcManagerError::from_transport_message(
                "mock",
                "connection reset by peer",
            ));
        }

        let Some(sent) = state.sent.iter().find(|tx| tx.tx_hash == tx_hash).cloned() else {
            return Ok(None);
        };

        match state.receipts {
            ReceiptBehavior::NeverMined => Ok(None),
            ReceiptBehavior::MineAfter {
                polls: wait,
                status,
                emit_event,
            } => {
                if polls <= wait {
                    return Ok(None);
                }
                let logs = match (&sent.call, emit_event, status) {
                    (Some(call), true, ReceiptStatus::Success) => Self::launch_logs(&state, call),
                    _ => Vec::new(),
                };
                Ok(Some(Receipt {
                    tx_hash,
                    status,
                    block_number: Some(1_000 + sent.nonce),
                    logs,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_accepts_and_mines_signed_launch() {
        let rpc = MockChainRpc::new().with_pending_nonce(5);
        let signed = test_signed_transaction(5);
        let hash = rpc.send_raw_transaction(signed.raw()).await.unwrap();
        assert_eq!(hash, signed.tx_hash());
        assert_eq!(rpc.pending_nonce_now(), 6);

        let sent = rpc.sent_transactions();
        let call = sent[0].call.as_ref().unwrap();
        assert_eq!(call.name, "Cool Ape");

        let receipt = rpc.transaction_receipt(hash).await.unwrap().unwrap();
        assert!(receipt.is_success());
        assert_eq!(receipt.logs.len(), 2);
        assert_eq!(receipt.logs[1].address, TEST_FACTORY);
    }

    #[tokio::test]
    async fn test_mock_unknown_hash_has_no_receipt() {
        let rpc = MockChainRpc::new();
        assert!(rpc
            .transaction_receipt(TxHash::repeat_byte(9))
            .await
            .unwrap()
            .is_none());
    }
}
