// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mutex that reports lock and unlock events
//!
//! [`NotifyingMutex`] behaves like an async mutex, but also hands out
//! one-shot [`Notification`]s that fire on the next lock or unlock. Tests use
//! them to learn exactly when a background task has taken or released shared
//! state, instead of sleeping and hoping.

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// An async mutex with lock/unlock notifications
pub struct NotifyingMutex<T> {
    inner: tokio::sync::Mutex<T>,
    watchers: Mutex<Watchers>,
}

#[derive(Default)]
struct Watchers {
    held: bool,
    on_lock: Vec<oneshot::Sender<()>>,
    on_unlock: Vec<oneshot::Sender<()>>,
}

impl<T> NotifyingMutex<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: tokio::sync::Mutex::new(value),
            watchers: Mutex::new(Watchers::default()),
        }
    }

    /// Lock the mutex, firing every pending lock notification once acquired
    pub async fn lock(&self) -> NotifyingGuard<'_, T> {
        let guard = self.inner.lock().await;
        let fire = {
            let mut watchers = self.lock_watchers();
            watchers.held = true;
            std::mem::take(&mut watchers.on_lock)
        };
        drop(Signals(fire));
        NotifyingGuard {
            guard,
            unlocked: Signals::default(),
            watchers: &self.watchers,
        }
    }

    /// Notification for the next successful `lock`.
    ///
    /// Already fired if the mutex is held right now.
    pub fn watch_next_lock(&self) -> Notification {
        let mut watchers = self.lock_watchers();
        if watchers.held {
            return Notification::fired();
        }
        let (tx, rx) = oneshot::channel();
        watchers.on_lock.push(tx);
        Notification::pending(rx)
    }

    /// Notification for the next unlock.
    ///
    /// Already fired if the mutex is free right now.
    pub fn watch_next_unlock(&self) -> Notification {
        let mut watchers = self.lock_watchers();
        if !watchers.held {
            return Notification::fired();
        }
        let (tx, rx) = oneshot::channel();
        watchers.on_unlock.push(tx);
        Notification::pending(rx)
    }

    pub fn is_locked(&self) -> bool {
        self.lock_watchers().held
    }

    fn lock_watchers(&self) -> std::sync::MutexGuard<'_, Watchers> {
        self.watchers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: Default> Default for NotifyingMutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Pending notifications, sent when dropped
#[derive(Default)]
struct Signals(Vec<oneshot::Sender<()>>);

impl Drop for Signals {
    fn drop(&mut self) {
        for tx in self.0.drain(..) {
            let _ = tx.send(());
        }
    }
}

/// Guard returned by [`NotifyingMutex::lock`]; unlocks on drop
pub struct NotifyingGuard<'a, T> {
    // Fields drop in order: the inner lock is released before `unlocked`
    // sends its notifications.
    guard: tokio::sync::MutexGuard<'a, T>,
    unlocked: Signals,
    watchers: &'a Mutex<Watchers>,
}

impl<T> Deref for NotifyingGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for NotifyingGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for NotifyingGuard<'_, T> {
    fn drop(&mut self) {
        // Mark released while the inner lock is still held, so the next
        // holder's `held = true` cannot be overwritten.
        let watchers = self.watchers;
        let mut watchers = watchers.lock().unwrap_or_else(|e| e.into_inner());
        watchers.held = false;
        self.unlocked.0 = std::mem::take(&mut watchers.on_unlock);
    }
}

/// One-shot signal from [`NotifyingMutex::watch_next_lock`] or
/// [`NotifyingMutex::watch_next_unlock`]
#[must_use = "notifications do nothing unless awaited"]
pub struct Notification {
    rx: Option<oneshot::Receiver<()>>,
}

impl Notification {
    fn fired() -> Self {
        Self { rx: None }
    }

    fn pending(rx: oneshot::Receiver<()>) -> Self {
        Self { rx: Some(rx) }
    }
}

impl Future for Notification {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let Some(rx) = self.rx.as_mut() else {
            return Poll::Ready(());
        };
        match Pin::new(rx).poll(cx) {
            Poll::Ready(_) => {
                self.rx = None;
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
