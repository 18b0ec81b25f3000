//! Integration tests for the launch pipeline through the public API
//!
//! This test validates:
//! - LaunchEngine wired from public building blocks
//! - Reporter output for success and failure outcomes
//! - Concurrent launches against one signing account

use futures::future::join_all;
use launchpad_bot::nonce_manager::NonceSequencer;
use launchpad_bot::reporter::LaunchReporter;
use launchpad_bot::rpc_manager::BroadcasterConfig;
use launchpad_bot::test_utils::{
    test_account, test_chain_params, MockChainRpc, ReceiptBehavior, TEST_ADDRESS, TEST_TOKEN,
};
use launchpad_bot::types::ReceiptStatus;
use launchpad_bot::{ErrorKind, LaunchEngine};
use std::sync::Arc;
use std::time::Duration;

fn fast_config() -> BroadcasterConfig {
    BroadcasterConfig {
        poll_interval: Duration::from_millis(5),
        ..BroadcasterConfig::default()
    }
}

#[tokio::test]
async fn test_launch_and_report_success() {
    let rpc = Arc::new(MockChainRpc::new().with_pending_nonce(1));
    let engine = LaunchEngine::connect(rpc.clone(), test_account(), test_chain_params(), fast_config())
        .await
        .unwrap();
    let reporter = LaunchReporter::new("https://basescan.org/tx/", 500);

    let result = engine.handle_launch_text("Cool Ape|CAPE|1000000000").await;
    assert!(result.is_success());
    assert_eq!(result.token_address(), Some(TEST_TOKEN));

    let reply = reporter.report(&result);
    assert!(reply.text.contains("Supply: 1,000,000,000"));
    assert!(reply.text.contains(&TEST_TOKEN.to_string()));
    let tx_hash = result.tx_hash().unwrap();
    assert!(reply.text.contains(&format!("https://basescan.org/tx/{}", tx_hash)));
}

#[tokio::test]
async fn test_revert_reply_links_transaction() {
    let rpc = Arc::new(MockChainRpc::new().with_receipts(ReceiptBehavior::MineAfter {
        polls: 0,
        status: ReceiptStatus::Reverted,
        emit_event: false,
    }));
    let engine = LaunchEngine::new(
        rpc,
        test_account(),
        NonceSequencer::new(TEST_ADDRESS, 0),
        test_chain_params(),
        fast_config(),
    );

    let result = engine.handle_launch_text("Name|SYMB|10").await;
    assert_eq!(result.error_kind(), Some(ErrorKind::TransactionReverted));

    let reply = LaunchReporter::new("https://basescan.org/tx/", 500).report(&result);
    assert!(reply.text.contains("reverted"));
    assert!(reply.text.contains("basescan.org/tx/0x"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_launches_share_one_account() {
    let rpc = Arc::new(MockChainRpc::new().with_send_delay(Duration::from_millis(1)));
    let engine = Arc::new(LaunchEngine::new(
        rpc.clone(),
        test_account(),
        NonceSequencer::new(TEST_ADDRESS, 0),
        test_chain_params(),
        fast_config(),
    ));

    let launches = (0..10).map(|i| {
        let engine = engine.clone();
        async move { engine.handle_launch_text(&format!("T{}|S{}|{}", i, i, i + 1)).await }
    });
    let results = join_all(launches).await;

    assert!(results.iter().all(|r| r.is_success()));
    assert_eq!(rpc.sent_nonces(), (0..10).collect::<Vec<u64>>());
}
