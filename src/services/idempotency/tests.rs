use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use super::*;
use crate::clock::ManualClock;
use crate::error::ErrorKind;
use crate::storage::InMemoryIdempotencyStore;

fn guard() -> (IdempotencyGuard, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at("2024-03-10T09:00:00Z").unwrap());
    let store = Arc::new(InMemoryIdempotencyStore::new());
    (IdempotencyGuard::new(store, clock.clone()), clock)
}

fn earn_fp(amount: i64) -> Fingerprint {
    Fingerprint::new(
        "POST",
        "/earn",
        &json!({"customerId": "cust_1", "amountMinor": amount, "currency": "NGN"}),
    )
}

#[tokio::test]
async fn test_check_absent_key_returns_none() {
    let (guard, _clock) = guard();
    assert!(guard.check("k-1", &earn_fp(250)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_replay_skips_operation() {
    let (guard, _clock) = guard();
    let calls = AtomicUsize::new(0);

    let run = || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"creditedPoints": 2}))
    };

    let first = guard.execute("k-1", earn_fp(250), run).await.unwrap();
    let second = guard
        .execute("k-1", earn_fp(250), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"creditedPoints": 999}))
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.to_string(), second.to_string());
}

#[tokio::test]
async fn test_conflicting_reuse_is_rejected() {
    let (guard, _clock) = guard();
    guard
        .execute("k-1", earn_fp(250), || async { Ok(json!({})) })
        .await
        .unwrap();

    let calls = AtomicUsize::new(0);
    let err = guard
        .execute("k-1", earn_fp(500), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({}))
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::IdempotencyConflict);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_operation_is_not_recorded() {
    let (guard, _clock) = guard();

    let err = guard
        .execute("k-1", earn_fp(250), || async {
            Err::<Value, _>(LoyaltyError::CustomerNotFound {
                id: "cust_1".to_string(),
            })
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(guard.check("k-1", &earn_fp(250)).await.unwrap().is_none());

    let retried = guard
        .execute("k-1", earn_fp(250), || async { Ok(json!({"ok": true})) })
        .await
        .unwrap();
    assert_eq!(retried, json!({"ok": true}));
}

#[tokio::test]
async fn test_stored_record_carries_fingerprint_digest() {
    let clock = Arc::new(ManualClock::at("2024-03-10T09:00:00Z").unwrap());
    let store = Arc::new(InMemoryIdempotencyStore::new());
    let guard = IdempotencyGuard::new(store.clone(), clock);
    let fp = earn_fp(250);

    guard.store("k-1", &fp, &json!({"n": 1})).await.unwrap();

    let record = store.get("k-1").await.unwrap().unwrap();
    assert_eq!(record.fingerprint, fp.digest());
    assert_eq!(record.method, "POST");
    assert_eq!(record.path, "/earn");
}

#[tokio::test]
async fn test_expired_key_can_be_reused() {
    let (guard, clock) = guard();
    let guard = guard.with_ttl(Some(Duration::from_secs(60)));

    guard
        .execute("k-1", earn_fp(250), || async { Ok(json!({"n": 1})) })
        .await
        .unwrap();

    // Still inside the window: different body conflicts.
    let err = guard.check("k-1", &earn_fp(500)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IdempotencyConflict);

    clock.advance(chrono::Duration::seconds(61));
    let reused = guard
        .execute("k-1", earn_fp(500), || async { Ok(json!({"n": 2})) })
        .await
        .unwrap();
    assert_eq!(reused, json!({"n": 2}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_key_executes_once() {
    let (guard, _clock) = guard();
    let guard = Arc::new(guard);
    let calls = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let guard = guard.clone();
        let calls = calls.clone();
        handles.push(tokio::spawn(async move {
            guard
                .execute("k-race", earn_fp(250), || async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok(json!({"execution": n}))
                })
                .await
        }));
    }

    let mut responses = Vec::new();
    for handle in handles {
        responses.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(responses.iter().all(|r| *r == json!({"execution": 0})));
}
