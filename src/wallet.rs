//! Wallet management module
//!
//! Holds the single signing key for the process. The key never leaves this
//! module: callers get an address and signed bytes, nothing else.

use crate::errors::LaunchError;
use crate::types::{SignedTransaction, UnsignedTransaction};
use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use zeroize::Zeroizing;

/// Errors loading the signing key
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Private key is empty")]
    Empty,

    #[error("Invalid private key: expected 32 bytes of hex")]
    InvalidKey,
}

/// Process-wide signing account.
///
/// Cheap to clone; all clones share the same key.
#[derive(Clone)]
pub struct SigningAccount {
    signer: Arc<PrivateKeySigner>,
}

impl SigningAccount {
    /// Load from a hex private key, with or without `0x`
    pub fn from_hex(secret: &Zeroizing<String>) -> Result<Self, WalletError> {
        let trimmed = secret.trim();
        let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        if hex.is_empty() {
            return Err(WalletError::Empty);
        }
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(WalletError::InvalidKey);
        }
        if hex.bytes().all(|b| b == b'0') {
            return Err(WalletError::InvalidKey);
        }

        let signer = PrivateKeySigner::from_str(hex).map_err(|_| WalletError::InvalidKey)?;
        Ok(Self {
            signer: Arc::new(signer),
        })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign a launch transaction with the EIP-155 legacy scheme.
    ///
    /// Deterministic for a given key and payload (RFC 6979 nonces).
    pub fn sign(&self, unsigned: &UnsignedTransaction) -> Result<SignedTransaction, LaunchError> {
        if unsigned.gas_limit == 0 {
            return Err(LaunchError::Signing("gas limit is zero".to_string()));
        }
        if unsigned.chain_id == 0 {
            return Err(LaunchError::Signing("chain id is zero".to_string()));
        }

        let mut tx = TxLegacy {
            chain_id: Some(unsigned.chain_id),
            nonce: unsigned.nonce,
            gas_price: unsigned.gas_price,
            gas_limit: unsigned.gas_limit,
            to: TxKind::Call(unsigned.to),
            value: U256::ZERO,
            input: unsigned.data.clone(),
        };

        let signature = self
            .signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| LaunchError::Signing(e.to_string()))?;

        let envelope: TxEnvelope = tx.into_signed(signature).into();
        let tx_hash = *envelope.tx_hash();
        let raw = envelope.encoded_2718();

        Ok(SignedTransaction::new(raw.into(), tx_hash, unsigned.nonce))
    }
}

impl std::fmt::Debug for SigningAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningAccount")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
