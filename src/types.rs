//! Common types used throughout the launch pipeline

use crate::errors::{ErrorKind, LaunchError};
use alloy::primitives::{Address, Bytes, LogData, TxHash, U256};

/// 10^18, one whole token in base units (every factory token has 18 decimals)
pub const BASE_UNITS_PER_TOKEN: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// A validated launch request.
///
/// Only constructible through [`LaunchRequest::new`], so a value of this type
/// always has a non-empty name and symbol and a supply that fits on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    name: String,
    symbol: String,
    supply_whole: U256,
    supply_onchain: U256,
}

impl LaunchRequest {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        supply_whole: U256,
    ) -> Result<Self, LaunchError> {
        let name = name.into().trim().to_string();
        let symbol = symbol.into().trim().to_string();

        if name.is_empty() {
            return Err(LaunchError::malformed("token name is empty"));
        }
        if symbol.is_empty() {
            return Err(LaunchError::malformed("token symbol is empty"));
        }

        let supply_onchain = supply_whole
            .checked_mul(BASE_UNITS_PER_TOKEN)
            .ok_or_else(|| LaunchError::InvalidSupply {
                input: supply_whole.to_string(),
            })?;

        Ok(Self {
            name,
            symbol,
            supply_whole,
            supply_onchain,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Supply in whole tokens, as typed by the requester
    pub fn supply_whole(&self) -> U256 {
        self.supply_whole
    }

    /// Supply in base units (`supply_whole × 10^18`)
    pub fn supply_onchain(&self) -> U256 {
        self.supply_onchain
    }
}

/// Legacy (EIP-155) transaction calling the factory, before signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub to: Address,
    pub data: Bytes,
    pub chain_id: u64,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub nonce: u64,
}

/// EIP-2718 encoded, signed transaction ready for broadcast.
///
/// Deliberately not `Clone`: it is handed to the broadcaster by value.
#[derive(Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    raw: Bytes,
    tx_hash: TxHash,
    nonce: u64,
}

impl SignedTransaction {
    pub(crate) fn new(raw: Bytes, tx_hash: TxHash, nonce: u64) -> Self {
        Self { raw, tx_hash, nonce }
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }
}

/// Execution status recorded in a receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// A log entry emitted during execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    /// Contract that emitted the log
    pub address: Address,
    pub data: LogData,
}

/// Chain-confirmed record of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub status: ReceiptStatus,
    pub block_number: Option<u64>,
    /// Logs in emission order
    pub logs: Vec<EventLog>,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// A token the factory deployed for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedToken {
    pub request: LaunchRequest,
    pub token_address: Address,
    pub tx_hash: TxHash,
}

/// Terminal outcome of one launch request.
///
/// Success and failure are exclusive by construction: a result carrying an
/// error can never also carry a token address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchResult {
    outcome: Result<LaunchedToken, LaunchError>,
}

impl LaunchResult {
    pub fn launched(token: LaunchedToken) -> Self {
        Self { outcome: Ok(token) }
    }

    pub fn failed(error: LaunchError) -> Self {
        Self {
            outcome: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn token_address(&self) -> Option<Address> {
        self.outcome.as_ref().ok().map(|t| t.token_address)
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match &self.outcome {
            Ok(token) => Some(token.tx_hash),
            Err(err) => err.tx_hash(),
        }
    }

    pub fn error(&self) -> Option<&LaunchError> {
        self.outcome.as_ref().err()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(LaunchError::kind)
    }

    pub fn outcome(&self) -> &Result<LaunchedToken, LaunchError> {
        &self.outcome
    }
}

impl From<Result<LaunchedToken, LaunchError>> for LaunchResult {
    fn from(outcome: Result<LaunchedToken, LaunchError>) -> Self {
        Self { outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_onchain_supply_scaling() {
        let req = LaunchRequest::new("Cool Ape", "CAPE", U256::from(1000u64)).unwrap();
        assert_eq!(req.supply_onchain(), U256::from(1000u64) * U256::from(10u64).pow(U256::from(18u64)));
        assert_eq!(BASE_UNITS_PER_TOKEN, U256::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn test_zero_supply_is_allowed() {
        let req = LaunchRequest::new("Zero", "ZRO", U256::ZERO).unwrap();
        assert_eq!(req.supply_onchain(), U256::ZERO);
    }

    #[test]
    fn test_supply_overflow_rejected() {
        let err = LaunchRequest::new("Big", "BIG", U256::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSupply);
    }

    #[test]
    fn test_blank_fields_rejected() {
        assert_eq!(
            LaunchRequest::new("  ", "SYM", U256::from(1u64)).unwrap_err().kind(),
            ErrorKind::MalformedRequest
        );
        assert_eq!(
            LaunchRequest::new("Name", "", U256::from(1u64)).unwrap_err().kind(),
            ErrorKind::MalformedRequest
        );
    }

    #[test]
    fn test_result_exclusivity() {
        let hash = TxHash::repeat_byte(7);
        let failed = LaunchResult::failed(LaunchError::ConfirmationTimeout {
            tx_hash: hash,
            waited_secs: 200,
        });
        assert!(!failed.is_success());
        assert!(failed.token_address().is_none());
        assert_eq!(failed.tx_hash(), Some(hash));
        assert_eq!(failed.error_kind(), Some(ErrorKind::ConfirmationTimeout));

        let launched = LaunchResult::launched(LaunchedToken {
            request: LaunchRequest::new("A", "B", U256::from(1u64)).unwrap(),
            token_address: Address::repeat_byte(0xab),
            tx_hash: hash,
        });
        assert!(launched.is_success());
        assert!(launched.error().is_none());
        assert_eq!(launched.token_address(), Some(Address::repeat_byte(0xab)));
    }
}
