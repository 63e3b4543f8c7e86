// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Arc;
use std::time::Duration;

async fn fired(notification: &mut Notification) -> bool {
    tokio::time::timeout(Duration::ZERO, notification)
        .await
        .is_ok()
}

#[tokio::test]
async fn lock_fires_lock_notification() {
    let mutex = NotifyingMutex::new(0u32);
    let mut locked = mutex.watch_next_lock();
    assert!(!fired(&mut locked).await);

    let _guard = mutex.lock().await;
    assert!(fired(&mut locked).await);
}

#[tokio::test]
async fn lock_notification_is_already_fired_while_held() {
    let mutex = NotifyingMutex::new(0u32);
    let _guard = mutex.lock().await;

    let mut locked = mutex.watch_next_lock();
    assert!(fired(&mut locked).await);
}

#[tokio::test]
async fn lock_notification_waits_for_a_lock() {
    let mutex = NotifyingMutex::new(0u32);
    drop(mutex.lock().await);

    let mut locked = mutex.watch_next_lock();
    assert!(!fired(&mut locked).await);
}

#[tokio::test]
async fn unlock_fires_unlock_notification() {
    let mutex = NotifyingMutex::new(0u32);
    let guard = mutex.lock().await;

    let mut unlocked = mutex.watch_next_unlock();
    assert!(!fired(&mut unlocked).await);

    drop(guard);
    assert!(fired(&mut unlocked).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unlock_waiter_finds_the_mutex_free() {
    for _ in 0..100 {
        let mutex = Arc::new(NotifyingMutex::new(0u32));
        let guard = mutex.lock().await;
        let unlocked = mutex.watch_next_unlock();

        let waiter = {
            let mutex = Arc::clone(&mutex);
            tokio::spawn(async move {
                unlocked.await;
                tokio::time::timeout(Duration::ZERO, mutex.lock())
                    .await
                    .is_ok()
            })
        };
        drop(guard);

        assert!(waiter.await.unwrap());
    }
}

#[tokio::test]
async fn unlock_notification_is_already_fired_while_free() {
    let mutex = NotifyingMutex::new(0u32);
    let mut unlocked = mutex.watch_next_unlock();
    assert!(fired(&mut unlocked).await);
}

#[tokio::test]
async fn each_watch_fires_for_the_next_event_only() {
    let mutex = NotifyingMutex::new(0u32);

    let mut first = mutex.watch_next_lock();
    drop(mutex.lock().await);
    assert!(fired(&mut first).await);

    let mut second = mutex.watch_next_lock();
    assert!(!fired(&mut second).await);
    drop(mutex.lock().await);
    assert!(fired(&mut second).await);
}

#[tokio::test]
async fn is_locked_tracks_guard_lifetime() {
    let mutex = NotifyingMutex::new(());
    assert!(!mutex.is_locked());
    let guard = mutex.lock().await;
    assert!(mutex.is_locked());
    drop(guard);
    assert!(!mutex.is_locked());
}

#[tokio::test]
async fn lock_watch_observes_background_mutation() {
    let mutex = Arc::new(NotifyingMutex::new(Vec::<&str>::new()));
    let locked = mutex.watch_next_lock();

    let background = Arc::clone(&mutex);
    tokio::spawn(async move {
        background.lock().await.push("written");
    });

    locked.await;
    // The background task holds the lock now; ours waits for its release
    let values = mutex.lock().await;
    assert_eq!(*values, vec!["written"]);
}

#[tokio::test]
async fn guard_gives_mutable_access() {
    let mutex = NotifyingMutex::new(1u32);
    {
        let mut value = mutex.lock().await;
        *value += 41;
    }
    assert_eq!(*mutex.lock().await, 42);
}
