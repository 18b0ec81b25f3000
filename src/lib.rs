//! Launchpad Bot - chat-driven token launches on Base
//!
//! Turns `Name|Symbol|Supply` chat messages into signed `launchToken` calls
//! on a factory contract and reports the deployed token address once the
//! transaction is mined.
//!
//! ## Pipeline
//!
//! - **validator**: free text to a typed [`types::LaunchRequest`]
//! - **nonce_manager**: single-account nonce sequencing with ordered broadcast
//! - **tx_builder**: call-data encoding and legacy transaction assembly
//! - **wallet**: process-wide signing key
//! - **rpc_manager**: chain access and the broadcast/confirmation stage
//! - **extractor**: token address from the factory's launch event
//! - **reporter**: terminal state to a chat reply
//! - **launch_engine**: the stages wired together
//! - **telegram**: Bot API front end

pub mod config;
pub mod endpoints;
pub mod errors;
pub mod extractor;
pub mod launch_engine;
pub mod metrics;
pub mod nonce_manager;
pub mod reporter;
pub mod rpc_manager;
pub mod structured_logging;
pub mod telegram;
pub mod test_utils;
pub mod tx_builder;
pub mod types;
pub mod validator;
pub mod wallet;

// Re-export commonly used types
pub use errors::{ErrorKind, LaunchError};
pub use launch_engine::LaunchEngine;
pub use types::{LaunchRequest, LaunchResult, LaunchedToken};
