// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background tasks that move messages between lifecycle states
//!
//! Two task shapes, both driven by the engine's [`Clock`]:
//! - a delay task makes a delayed message visible once its delay elapses
//! - an expiry task returns a reservation's message to its queue once the
//!   reservation times out, unless it was deleted first
//!
//! The alarm for each task is registered before the task is spawned, so the
//! deadline is counted from the call that scheduled it. The task carries the
//! [`Due`] stamp of that deadline into the store, so tasks released by one
//! clock step still land in deadline order.

use crate::store::{Due, QueueKey, Store};
use mq_core::{Clock, Message, NotifyingMutex, ReservationId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Spawns delay and expiry tasks against a shared store
#[derive(Clone)]
pub(crate) struct Scheduler<C> {
    store: Arc<NotifyingMutex<Store>>,
    clock: C,
    shutdown: CancellationToken,
    next_seq: Arc<AtomicU64>,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(store: Arc<NotifyingMutex<Store>>, clock: C) -> Self {
        Self {
            store,
            clock,
            shutdown: CancellationToken::new(),
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Stamp for something becoming visible `after` from now
    pub fn due(&self, after: Duration) -> Due {
        Due {
            at: self.clock.now() + after,
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
        }
    }

    /// Make `message` visible on `key` after its delay
    pub fn schedule_visibility(&self, key: QueueKey, message: Message) -> JoinHandle<()> {
        let due = self.due(message.delay());
        let alarm = self.clock.after(message.delay());
        let store = Arc::clone(&self.store);
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    tracing::debug!(queue = %key, message_id = %message.id, "delayed message dropped on shutdown");
                    return;
                }
                () = alarm => {}
            }

            let mut store = store.lock().await;
            tracing::debug!(queue = %key, message_id = %message.id, "delay elapsed, message visible");
            store.push_visible(&key, message, due);
        })
    }

    /// Requeue the reservation's message after `timeout` unless it is
    /// deleted first
    pub fn schedule_expiry(&self, reservation_id: ReservationId, timeout: Duration) -> JoinHandle<()> {
        let due = self.due(timeout);
        let alarm = self.clock.after(timeout);
        let store = Arc::clone(&self.store);
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => return,
                () = alarm => {}
            }

            // Check and removal share one lock acquisition, so a concurrent
            // delete and this expiry cannot both act on the reservation.
            let mut store = store.lock().await;
            match store.requeue_expired(&reservation_id, due) {
                Some((queue, message_id)) => tracing::debug!(
                    %queue,
                    %message_id,
                    %reservation_id,
                    "reservation expired, message requeued"
                ),
                None => tracing::trace!(%reservation_id, "reservation already resolved"),
            }
        })
    }

    /// Stop every pending task without touching the store
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Resolves once [`Scheduler::shutdown`] has been called
    pub fn stopped(&self) -> WaitForCancellationFuture<'_> {
        self.shutdown.cancelled()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
