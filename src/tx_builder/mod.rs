//! Transaction Builder
//!
//! Turns a validated [`LaunchRequest`](crate::types::LaunchRequest), a
//! reserved nonce and the current gas price into an unsigned legacy
//! transaction calling the factory's `launchToken`.
//!
//! - **contract**: compiled-in factory ABI (`alloy::sol!`)
//! - **builder**: call-data encoding and transaction assembly

pub mod builder;
pub mod contract;

pub use builder::{build_launch_transaction, encode_launch_call, ChainParams, TxBuilder};
pub use contract::{launchTokenCall, LaunchpadFactory, TokenLaunched};
