//! Nonce Manager Module
//!
//! Single-account nonce sequencing for the launch pipeline. The counter is
//! seeded from the chain's pending transaction count once at startup and is
//! advanced purely in memory afterwards.

pub mod nonce_errors;
pub mod nonce_sequencer;

pub use nonce_errors::{NonceError, NonceResult};
pub use nonce_sequencer::{NonceLease, NonceSequencer, ResyncReport};
