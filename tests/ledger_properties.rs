//! Ledger property tests
//!
//! Exercise the engines against the in-memory store under concurrency,
//! injected storage faults and cancellation, plus the reference scenarios of
//! the shop.

use coin_ledger::core::{Catalog, LedgerConfig, Shop};
use coin_ledger::store::{FaultPoint, InMemoryLedgerStore};
use coin_ledger::types::{Coins, ErrorKind, LedgerError};
use coin_ledger::{LedgerStore, UnitOfWork};
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;

fn shop_with(
    accounts: &[(&str, Coins)],
    config: LedgerConfig,
) -> (Arc<InMemoryLedgerStore>, Shop<InMemoryLedgerStore>) {
    let store = Arc::new(InMemoryLedgerStore::with_accounts(
        accounts.iter().map(|(name, coins)| (name.to_string(), *coins)),
    ));
    let shop = Shop::new(Arc::clone(&store), Arc::new(config));
    (store, shop)
}

async fn total_coins(store: &InMemoryLedgerStore) -> Coins {
    store
        .accounts()
        .await
        .unwrap()
        .iter()
        .map(|account| account.coins)
        .sum()
}

// Concurrency

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_full_balance_drains_exactly_one_wins() {
    for _ in 0..25 {
        let (store, shop) = shop_with(
            &[("alice", 1000), ("bob", 0), ("carol", 0)],
            LedgerConfig::default(),
        );

        let first = {
            let shop = shop.clone();
            tokio::spawn(async move { shop.transfer("alice", "bob", 1000).await })
        };
        let second = {
            let shop = shop.clone();
            tokio::spawn(async move { shop.transfer("alice", "carol", 1000).await })
        };
        let results = [first.await.unwrap(), second.await.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert_eq!(
            failure,
            &LedgerError::insufficient_balance("alice", 0, 1000)
        );

        assert_eq!(store.balance("alice").await.unwrap(), 0);
        assert_eq!(
            store.balance("bob").await.unwrap() + store.balance("carol").await.unwrap(),
            1000
        );
        assert_eq!(store.transfer_count(), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_purchases_never_overspend() {
    let (store, shop) = shop_with(&[("alice", 1000)], LedgerConfig::default());

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let shop = shop.clone();
        tasks.push(tokio::spawn(async move {
            shop.purchase("alice", "pink-hoody", 1).await
        }));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => successes += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::InsufficientBalance),
        }
    }

    assert_eq!(successes, 2);
    assert_eq!(store.balance("alice").await.unwrap(), 0);
    assert_eq!(store.purchase_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_random_transfers_conserve_coins() {
    let names = ["a", "b", "c", "d", "e", "f", "g", "h"];
    let accounts: Vec<(&str, Coins)> = names.iter().map(|name| (*name, 300)).collect();
    let (store, shop) = shop_with(&accounts, LedgerConfig::default());

    // Linear congruential generator: deterministic without a rand dependency
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        seed = seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (seed >> 33) as usize
    };

    let mut tasks = Vec::new();
    for _ in 0..400 {
        let from = names[next() % names.len()];
        let to = names[next() % names.len()];
        let amount = (next() % 120) as Coins;
        let shop = shop.clone();
        tasks.push(tokio::spawn(async move { shop.transfer(from, to, amount).await }));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => successes += 1,
            Err(e) => assert!(
                matches!(
                    e.kind(),
                    ErrorKind::InvalidRecipient
                        | ErrorKind::InvalidAmount
                        | ErrorKind::InsufficientBalance
                ),
                "unexpected error: {}",
                e
            ),
        }
    }

    assert_eq!(total_coins(&store).await, 300 * names.len() as Coins);
    for account in store.accounts().await.unwrap() {
        assert!(account.coins >= 0, "{} went negative", account.username);
    }
    assert_eq!(store.transfer_count(), successes);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_of_one_name() {
    let (store, shop) = shop_with(&[], LedgerConfig::default());

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let shop = shop.clone();
        tasks.push(tokio::spawn(async move { shop.register("erin").await }));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert_eq!(e, LedgerError::username_exists("erin")),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(store.balance("erin").await.unwrap(), 1000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_receiver_registered_mid_transfer_cannot_deadlock() {
    let (store, shop) = shop_with(&[("sam", 1000)], LedgerConfig::default());

    // Hold sam's row so the first transfer skips the missing amy, then waits on sam
    let mut holder = store.begin().await.unwrap();
    holder.lock_accounts(&["sam"]).await.unwrap();

    let to_amy = {
        let shop = shop.clone();
        tokio::spawn(async move { shop.transfer("sam", "amy", 10).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    shop.register("amy").await.unwrap();

    // Locks amy, then queues on sam behind the first transfer
    let to_sam = {
        let shop = shop.clone();
        tokio::spawn(async move { shop.transfer("amy", "sam", 10).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    holder.rollback().await.unwrap();

    let to_amy = tokio::time::timeout(Duration::from_secs(2), to_amy)
        .await
        .expect("transfer to amy never finished")
        .unwrap();
    let to_sam = tokio::time::timeout(Duration::from_secs(2), to_sam)
        .await
        .expect("transfer to sam never finished")
        .unwrap();

    assert_eq!(to_amy, Err(LedgerError::account_not_found("amy")));
    assert_eq!(to_sam, Ok(()));
    assert_eq!(store.balance("sam").await.unwrap(), 1010);
    assert_eq!(store.balance("amy").await.unwrap(), 990);
    assert_eq!(store.transfer_count(), 1);
}

// Injected storage faults

#[rstest]
#[case::begin(FaultPoint::Begin)]
#[case::lock(FaultPoint::Lock)]
#[case::debit(FaultPoint::Debit)]
#[case::credit(FaultPoint::Credit)]
#[case::append(FaultPoint::AppendTransfer)]
#[case::commit(FaultPoint::Commit)]
#[tokio::test]
async fn test_transfer_fault_has_no_partial_effect(#[case] point: FaultPoint) {
    let (store, shop) = shop_with(&[("alice", 1000), ("bob", 0)], LedgerConfig::default());
    store.inject_fault(point);

    let err = shop.transfer("alice", "bob", 250).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StorageFailure);
    assert_eq!(store.balance("alice").await.unwrap(), 1000);
    assert_eq!(store.balance("bob").await.unwrap(), 0);
    assert!(store.transfers_of("alice").await.unwrap().is_empty());

    // The operation is safe to retry once the store recovers
    shop.transfer("alice", "bob", 250).await.unwrap();
    assert_eq!(store.balance("alice").await.unwrap(), 750);
    assert_eq!(store.balance("bob").await.unwrap(), 250);
}

#[rstest]
#[case::debit(FaultPoint::Debit)]
#[case::append(FaultPoint::AppendPurchase)]
#[case::commit(FaultPoint::Commit)]
#[tokio::test]
async fn test_purchase_fault_has_no_partial_effect(#[case] point: FaultPoint) {
    let (store, shop) = shop_with(&[("alice", 1000)], LedgerConfig::default());
    store.inject_fault(point);

    assert!(shop.purchase("alice", "book", 2).await.is_err());

    assert_eq!(store.balance("alice").await.unwrap(), 1000);
    assert!(store.purchases_of("alice").await.unwrap().is_empty());
}

// Cancellation

#[tokio::test]
async fn test_cancelled_transfer_waiting_on_lock_applies_nothing() {
    let (store, shop) = shop_with(&[("alice", 1000), ("bob", 0)], LedgerConfig::default());

    // Hold bob's row so the transfer locks alice, then waits on bob
    let mut holder = store.begin().await.unwrap();
    holder.lock_accounts(&["bob"]).await.unwrap();

    let attempt = tokio::time::timeout(
        Duration::from_millis(50),
        shop.transfer("alice", "bob", 400),
    )
    .await;
    assert!(attempt.is_err(), "transfer should still be waiting on bob's row");

    holder.rollback().await.unwrap();

    assert_eq!(store.balance("alice").await.unwrap(), 1000);
    assert_eq!(store.balance("bob").await.unwrap(), 0);
    assert_eq!(store.transfer_count(), 0);

    // Alice's row was released when the cancelled future was dropped
    shop.transfer("alice", "bob", 400).await.unwrap();
    assert_eq!(store.balance("alice").await.unwrap(), 600);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_aborted_task_applies_nothing() {
    let (store, shop) = shop_with(&[("alice", 1000), ("bob", 0)], LedgerConfig::default());

    let mut holder = store.begin().await.unwrap();
    holder.lock_accounts(&["alice"]).await.unwrap();

    let task = {
        let shop = shop.clone();
        tokio::spawn(async move { shop.purchase("alice", "hoody", 1).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    holder.commit().await.unwrap();

    assert_eq!(store.balance("alice").await.unwrap(), 1000);
    assert_eq!(store.purchase_count(), 0);
}

// Reference scenarios

#[tokio::test]
async fn test_buying_socks_at_full_balance() {
    let catalog = Catalog::from_items([("socks", 1000)]).unwrap();
    let (store, shop) = shop_with(&[("alice", 1000)], LedgerConfig::new(catalog, 1000));

    shop.purchase("alice", "socks", 1).await.unwrap();

    assert_eq!(store.balance("alice").await.unwrap(), 0);
    let purchases = store.purchases_of("alice").await.unwrap();
    assert_eq!(purchases.len(), 1);
    assert_eq!(
        (
            purchases[0].account.as_str(),
            purchases[0].item.as_str(),
            purchases[0].quantity,
            purchases[0].total_price
        ),
        ("alice", "socks", 1, 1000)
    );
}

#[tokio::test]
async fn test_transfer_hundred_from_alice_to_bob() {
    let (store, shop) = shop_with(&[("alice", 1000), ("bob", 1000)], LedgerConfig::default());

    shop.transfer("alice", "bob", 100).await.unwrap();

    assert_eq!(store.balance("alice").await.unwrap(), 900);
    assert_eq!(store.balance("bob").await.unwrap(), 1100);
    let transfers = store.transfers_of("bob").await.unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(
        (transfers[0].sender.as_str(), transfers[0].receiver.as_str(), transfers[0].amount),
        ("alice", "bob", 100)
    );
}

#[tokio::test]
async fn test_zero_transfer_changes_nothing() {
    let (store, shop) = shop_with(&[("alice", 1000), ("bob", 1000)], LedgerConfig::default());

    assert_eq!(
        shop.transfer("alice", "bob", 0).await.unwrap_err(),
        LedgerError::invalid_amount(0)
    );

    assert_eq!(total_coins(&store).await, 2000);
    assert_eq!(store.transfer_count(), 0);
}

#[tokio::test]
async fn test_unknown_item_changes_nothing() {
    let (store, shop) = shop_with(&[("alice", 1000)], LedgerConfig::default());

    let err = shop.purchase("alice", "unknown-item", 1).await.unwrap_err();

    assert_eq!(err, LedgerError::item_not_found("unknown-item"));
    assert_eq!(store.balance("alice").await.unwrap(), 1000);
    assert_eq!(store.purchase_count(), 0);
}

#[tokio::test]
async fn test_self_transfer_rejected_regardless_of_balance() {
    let (_store, shop) = shop_with(&[("alice", 0)], LedgerConfig::default());

    for amount in [0, 1, 1000, -1] {
        assert_eq!(
            shop.transfer("alice", "alice", amount).await.unwrap_err(),
            LedgerError::invalid_recipient("alice")
        );
    }
}

#[tokio::test]
async fn test_new_user_history() {
    let (_store, shop) = shop_with(&[], LedgerConfig::default());

    shop.register("newbie").await.unwrap();
    let history = shop.history("newbie").await.unwrap();

    assert_eq!(
        serde_json::to_value(&history).unwrap(),
        serde_json::json!({
            "coins": 1000,
            "inventory": [],
            "coinHistory": { "received": [], "sent": [] }
        })
    );
}
