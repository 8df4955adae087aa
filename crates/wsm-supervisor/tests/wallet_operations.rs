//! Integration tests for wallet queries and transfers.
//!
//! A fake daemon process keeps the supervisor running while the RPC calls
//! are answered by `FakeRpc`.

#![cfg(unix)]

mod common;

use common::{other_address, own_address, supervisor_with, FakeRpc, FakeScanner, SERVING};
use std::sync::Arc;
use tempfile::TempDir;
use wsm_core::{Amount, SyncStatus, TransferError};
use wsm_rpc::{Balance, DaemonStatus, RpcError};
use wsm_supervisor::{Platform, Supervisor, SupervisorError};

// ============================================================================
// Test Helpers
// ============================================================================

async fn running(dir: &TempDir, rpc: Arc<FakeRpc>) -> Supervisor {
    let mut supervisor = supervisor_with(dir, Platform::Linux, SERVING, rpc, FakeScanner::empty());
    supervisor.start("main.wallet", "pw").await.unwrap();
    supervisor
}

fn set_status(rpc: &FakeRpc, block_count: u64, known_block_count: u64) {
    rpc.update(|s| {
        s.status = Ok(DaemonStatus {
            block_count,
            known_block_count,
            peer_count: 3,
        })
    });
}

// ============================================================================
// Not Running
// ============================================================================

#[tokio::test]
async fn test_operations_require_running_daemon() {
    let dir = TempDir::new().unwrap();
    let mut supervisor = supervisor_with(
        &dir,
        Platform::Linux,
        SERVING,
        FakeRpc::ready(),
        FakeScanner::empty(),
    );

    assert!(matches!(
        supervisor.request_balance().await,
        Err(SupervisorError::NotRunning)
    ));
    assert!(matches!(
        supervisor.request_address().await,
        Err(SupervisorError::NotRunning)
    ));
    assert!(matches!(
        supervisor.request_connection_info().await,
        Err(SupervisorError::NotRunning)
    ));
    assert!(matches!(
        supervisor.request_list_transactions().await,
        Err(SupervisorError::NotRunning)
    ));
    assert!(matches!(
        supervisor.send_transaction(&other_address(), "1", "").await,
        Err(SupervisorError::NotRunning)
    ));
    assert!(matches!(
        supervisor.private_keys().await,
        Err(SupervisorError::NotRunning)
    ));
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_balance_and_address_are_cached() {
    let dir = TempDir::new().unwrap();
    let rpc = FakeRpc::ready();
    let mut supervisor = running(&dir, rpc.clone()).await;

    let balance = supervisor.request_balance().await.unwrap();
    assert_eq!(balance.total(), Amount::from_coins(105.0));
    assert_eq!(supervisor.session().available_balance, Amount::from_coins(100.0));
    assert_eq!(supervisor.session().locked_balance, Amount::from_coins(5.0));

    let address = supervisor.request_address().await.unwrap();
    assert_eq!(address, own_address());
    assert_eq!(supervisor.session().address, own_address());

    supervisor.stop().await;
    assert!(supervisor.session().address.is_empty());
    assert!(supervisor.session().available_balance.is_zero());
}

#[tokio::test]
async fn test_rpc_failure_leaves_cache_untouched() {
    let dir = TempDir::new().unwrap();
    let rpc = FakeRpc::ready();
    let mut supervisor = running(&dir, rpc.clone()).await;

    supervisor.request_balance().await.unwrap();
    rpc.update(|s| s.balance = Err(RpcError::Unauthorized));

    let result = supervisor.request_balance().await;

    assert!(matches!(
        result,
        Err(SupervisorError::Rpc(RpcError::Unauthorized))
    ));
    assert_eq!(supervisor.session().available_balance, Amount::from_coins(100.0));
    assert_eq!(supervisor.session().locked_balance, Amount::from_coins(5.0));

    supervisor.stop().await;
}

#[tokio::test]
async fn test_connection_info_classification() {
    let dir = TempDir::new().unwrap();
    let rpc = FakeRpc::ready();
    let mut supervisor = running(&dir, rpc.clone()).await;

    set_status(&rpc, 100, 0);
    let info = supervisor.request_connection_info().await.unwrap();
    assert_eq!(info.sync, SyncStatus::AcquiringHeight);
    assert!(!supervisor.session().synced);

    set_status(&rpc, 100, 100);
    let info = supervisor.request_connection_info().await.unwrap();
    assert_eq!(info.sync, SyncStatus::Synced);
    assert_eq!(info.peer_count, 3);
    assert!(supervisor.session().synced);

    set_status(&rpc, 50, 100);
    let info = supervisor.request_connection_info().await.unwrap();
    assert_eq!(info.sync, SyncStatus::Syncing);
    assert!(!supervisor.session().synced);

    supervisor.stop().await;
}

#[tokio::test]
async fn test_list_transactions_queries_own_address() {
    let dir = TempDir::new().unwrap();
    let rpc = FakeRpc::ready();
    let mut supervisor = running(&dir, rpc.clone()).await;
    set_status(&rpc, 250, 250);

    let transfers = supervisor.request_list_transactions().await.unwrap();

    assert!(transfers.is_empty());
    let queries = rpc.read(|s| s.queries.clone());
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].first_block_index, 1);
    assert_eq!(queries[0].block_count, 250);
    assert_eq!(queries[0].addresses, vec![own_address()]);

    supervisor.stop().await;
}

#[tokio::test]
async fn test_private_keys() {
    let dir = TempDir::new().unwrap();
    let rpc = FakeRpc::ready();
    let mut supervisor = running(&dir, rpc.clone()).await;

    let (view_key, spend_key) = supervisor.private_keys().await.unwrap();

    assert_eq!(view_key, "view-private");
    assert_eq!(spend_key, "spend-private");

    supervisor.stop().await;
}

// ============================================================================
// Transfers
// ============================================================================

#[tokio::test]
async fn test_send_transaction_rejections() {
    let dir = TempDir::new().unwrap();
    let rpc = FakeRpc::ready();
    let mut supervisor = running(&dir, rpc.clone()).await;
    supervisor.request_balance().await.unwrap();

    let cases = [
        (format!("BADPREFIX{}", "c".repeat(90)), "10", TransferError::InvalidAddress),
        ("TRTLshort".to_string(), "10", TransferError::InvalidAddress),
        (own_address(), "10", TransferError::SelfSend),
        (other_address(), "0", TransferError::InvalidAmount),
        (other_address(), "-5", TransferError::InvalidAmount),
        (other_address(), "abc", TransferError::InvalidAmount),
        (other_address(), "4900000", TransferError::InsufficientBalance),
    ];

    for (destination, amount, expected) in cases {
        let result = supervisor.send_transaction(&destination, amount, "").await;
        match result {
            Err(SupervisorError::Transfer(error)) => assert_eq!(error, expected, "{amount}"),
            other => panic!("expected {expected:?} for {amount}, got {other:?}"),
        }
    }

    assert!(rpc.read(|s| s.sent.is_empty()));
    supervisor.stop().await;
}

#[tokio::test]
async fn test_send_transaction_checks_destination_before_address_lookup() {
    let dir = TempDir::new().unwrap();
    let rpc = FakeRpc::ready();
    rpc.update(|s| s.address = Err(RpcError::Unreachable("down".into())));
    let mut supervisor = running(&dir, rpc.clone()).await;
    assert!(supervisor.session().address.is_empty());

    let result = supervisor.send_transaction("BADPREFIX", "10", "").await;

    assert!(matches!(
        result,
        Err(SupervisorError::Transfer(TransferError::InvalidAddress))
    ));
    assert!(rpc.read(|s| s.sent.is_empty()));

    supervisor.stop().await;
}

#[tokio::test]
async fn test_send_transaction_rejects_sub_atomic_amounts() {
    let dir = TempDir::new().unwrap();
    let rpc = FakeRpc::ready();
    let mut supervisor = running(&dir, rpc.clone()).await;
    supervisor.request_balance().await.unwrap();

    for amount in ["1.239", "0.005"] {
        let result = supervisor.send_transaction(&other_address(), amount, "").await;
        assert!(
            matches!(result, Err(SupervisorError::Transfer(TransferError::InvalidAmount))),
            "{amount} should be rejected, got {result:?}"
        );
    }
    assert!(rpc.read(|s| s.sent.is_empty()));

    supervisor.stop().await;
}

#[tokio::test]
async fn test_send_transaction_over_ceiling() {
    let dir = TempDir::new().unwrap();
    let rpc = FakeRpc::ready();
    rpc.update(|s| {
        s.balance = Ok(Balance {
            available: Amount::from_coins(10_000_000.0),
            locked: Amount::zero(),
        })
    });
    let mut supervisor = running(&dir, rpc.clone()).await;
    supervisor.request_balance().await.unwrap();

    let result = supervisor
        .send_transaction(&other_address(), "6000000", "")
        .await;

    assert!(matches!(
        result,
        Err(SupervisorError::Transfer(TransferError::AmountTooLarge { .. }))
    ));
    assert!(rpc.read(|s| s.sent.is_empty()));

    supervisor.stop().await;
}

#[tokio::test]
async fn test_send_transaction_submits_with_fee_and_mixin() {
    let dir = TempDir::new().unwrap();
    let rpc = FakeRpc::ready();
    let mut supervisor = running(&dir, rpc.clone()).await;
    supervisor.request_balance().await.unwrap();

    let tx_hash = supervisor
        .send_transaction(&other_address(), "12.5", "deadbeef")
        .await
        .unwrap();

    assert_eq!(tx_hash, "f".repeat(64));
    let sent = rpc.read(|s| s.sent.clone());
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].destination, other_address());
    assert_eq!(sent[0].amount, Amount::from_coins(12.5));
    assert_eq!(sent[0].fee, Amount::from_coins(1.0));
    assert_eq!(sent[0].mixin, 4);
    assert_eq!(sent[0].payment_id, "deadbeef");

    supervisor.stop().await;
}

#[tokio::test]
async fn test_send_transaction_rpc_error_is_returned() {
    let dir = TempDir::new().unwrap();
    let rpc = FakeRpc::ready();
    rpc.update(|s| {
        s.send_result = Err(RpcError::Daemon {
            code: -7,
            message: "not enough outputs".to_string(),
        })
    });
    let mut supervisor = running(&dir, rpc.clone()).await;
    supervisor.request_balance().await.unwrap();

    let result = supervisor.send_transaction(&other_address(), "1", "").await;

    assert!(matches!(
        result,
        Err(SupervisorError::Rpc(RpcError::Daemon { code: -7, .. }))
    ));

    supervisor.stop().await;
}
