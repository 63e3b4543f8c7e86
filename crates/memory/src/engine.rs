// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory queue engine
//!
//! [`MemClient`] implements the [`Client`] contract entirely in process.
//! All queue and reservation state sits behind one [`NotifyingMutex`];
//! delayed messages and reservation expiry run as background tasks on the
//! injected [`Clock`].

use crate::config::EngineConfig;
use crate::scheduler::Scheduler;
use crate::store::{QueueKey, Reservation, Store};
use async_trait::async_trait;
use mq_core::{
    Client, ClientError, Clock, Deleted, DequeueOptions, Enqueued, IdGen, Message, MessageId,
    NewMessage, NotifyingMutex, ReservationId, SystemClock, UuidIdGen,
};
#[cfg(any(test, feature = "test-support"))]
use mq_core::Notification;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const ENQUEUED_MSG: &str = "Messages put on queue";
const DELETED_MSG: &str = "deleted";

/// In-memory [`Client`] for tests and local development
///
/// Cloning is cheap; clones share the same queues. Background tasks stop
/// when the last clone is dropped or [`MemClient::shutdown`] is called;
/// after a shutdown every operation fails with [`ClientError::Shutdown`].
pub struct MemClient<C: Clock = SystemClock, G: IdGen = UuidIdGen> {
    shared: Arc<Shared<C, G>>,
}

struct Shared<C: Clock, G: IdGen> {
    store: Arc<NotifyingMutex<Store>>,
    scheduler: Scheduler<C>,
    id_gen: G,
    /// Last assigned message ID
    last_id: AtomicU64,
    config: EngineConfig,
}

impl<C: Clock, G: IdGen> Drop for Shared<C, G> {
    fn drop(&mut self) {
        self.scheduler.shutdown();
    }
}

impl<C: Clock, G: IdGen> Clone for MemClient<C, G> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl MemClient {
    /// Engine on the system clock with UUID reservation tokens
    pub fn new() -> Self {
        Self::with_deps(EngineConfig::default(), SystemClock, UuidIdGen)
    }
}

impl Default for MemClient {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, G: IdGen> MemClient<C, G> {
    pub fn with_deps(config: EngineConfig, clock: C, id_gen: G) -> Self {
        let store = Arc::new(NotifyingMutex::new(Store::default()));
        let scheduler = Scheduler::new(Arc::clone(&store), clock);
        Self {
            shared: Arc::new(Shared {
                store,
                scheduler,
                id_gen,
                last_id: AtomicU64::new(0),
                config,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    pub fn clock(&self) -> &C {
        self.shared.scheduler.clock()
    }

    /// Snapshot of the visible messages of a queue, head first
    pub async fn peek(&self, scope: &str, queue: &str) -> Vec<Message> {
        let key = QueueKey::new(scope, queue);
        let store = self.shared.store.lock().await;
        store.visible(&key).cloned().collect()
    }

    /// Number of visible messages in a queue
    pub async fn visible_len(&self, scope: &str, queue: &str) -> usize {
        let key = QueueKey::new(scope, queue);
        self.shared.store.lock().await.visible_len(&key)
    }

    /// Number of outstanding reservations across all queues
    pub async fn reservation_count(&self) -> usize {
        self.shared.store.lock().await.reservation_count()
    }

    /// Snapshot of a live reservation
    pub async fn reservation(&self, id: &ReservationId) -> Option<Reservation> {
        self.shared.store.lock().await.reservation(id).cloned()
    }

    /// Stop all delay and expiry tasks and refuse further operations.
    ///
    /// Messages still waiting out their delay are dropped; reserved messages
    /// stay reserved. Dequeues still waiting return [`ClientError::Shutdown`].
    pub fn shutdown(&self) {
        tracing::debug!("shutting down queue engine");
        self.shared.scheduler.shutdown();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.scheduler.is_shutdown()
    }

    /// Fires the next time any operation or background task takes the
    /// state lock (immediately if it is held now)
    #[cfg(any(test, feature = "test-support"))]
    pub fn watch_next_lock(&self) -> Notification {
        self.shared.store.watch_next_lock()
    }

    /// Fires the next time the state lock is released (immediately if it is
    /// free now)
    #[cfg(any(test, feature = "test-support"))]
    pub fn watch_next_unlock(&self) -> Notification {
        self.shared.store.watch_next_unlock()
    }

    fn next_message_id(&self) -> MessageId {
        MessageId(self.shared.last_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn ensure_running(&self) -> Result<(), ClientError> {
        if self.is_shutdown() {
            return Err(ClientError::Shutdown);
        }
        Ok(())
    }

    /// Pop up to `options.num` visible messages, reserving them unless
    /// `options.delete` is set
    async fn take_visible(
        &self,
        key: &QueueKey,
        options: DequeueOptions,
    ) -> Result<Vec<Message>, ClientError> {
        let mut store = self.shared.store.lock().await;
        // A reservation made now would never expire
        self.ensure_running()?;
        let popped = store.pop_visible(key, options.num);
        if popped.is_empty() {
            return Ok(popped);
        }

        let timeout = options.timeout.as_duration();
        let expires_at = self.clock().now() + timeout;
        let mut taken = Vec::with_capacity(popped.len());

        for mut message in popped {
            message.reserved_count += 1;
            let reservation_id = self.shared.id_gen.next();
            message.reservation_id = Some(reservation_id.clone());

            if options.delete {
                tracing::debug!(queue = %key, message_id = %message.id, "message consumed");
            } else {
                tracing::debug!(
                    queue = %key,
                    message_id = %message.id,
                    %reservation_id,
                    reserved_count = message.reserved_count,
                    "message reserved"
                );
                store.reserve(Reservation {
                    id: reservation_id.clone(),
                    queue: key.clone(),
                    message: message.clone(),
                    expires_at,
                });
                self.shared
                    .scheduler
                    .schedule_expiry(reservation_id, timeout);
            }
            taken.push(message);
        }
        Ok(taken)
    }
}

#[async_trait]
impl<C: Clock, G: IdGen> Client for MemClient<C, G> {
    async fn enqueue(
        &self,
        cancel: &CancellationToken,
        scope: &str,
        queue: &str,
        messages: Vec<NewMessage>,
    ) -> Result<Enqueued, ClientError> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        self.ensure_running()?;
        let max = self.shared.config.max_delay_secs();
        if let Some(message) = messages.iter().find(|m| m.delay > max) {
            return Err(ClientError::DelayOutOfRange {
                delay: message.delay,
                max,
            });
        }

        let key = QueueKey::new(scope, queue);
        let mut ids = Vec::with_capacity(messages.len());
        let mut visible = Vec::new();

        for new in messages {
            let message = Message::new(self.next_message_id(), new);
            ids.push(message.id);
            if message.delay > 0 {
                tracing::debug!(queue = %key, message_id = %message.id, delay = message.delay, "message delayed");
                self.shared
                    .scheduler
                    .schedule_visibility(key.clone(), message);
            } else {
                let due = self.shared.scheduler.due(Duration::ZERO);
                visible.push((message, due));
            }
        }

        if !visible.is_empty() {
            let mut store = self.shared.store.lock().await;
            for (message, due) in visible {
                tracing::debug!(queue = %key, message_id = %message.id, "message enqueued");
                store.push_visible(&key, message, due);
            }
        }

        Ok(Enqueued {
            ids,
            msg: ENQUEUED_MSG.to_string(),
        })
    }

    async fn dequeue(
        &self,
        cancel: &CancellationToken,
        scope: &str,
        queue: &str,
        options: DequeueOptions,
    ) -> Result<Vec<Message>, ClientError> {
        if !options.timeout.in_range() {
            return Err(ClientError::TimeoutOutOfRange(options.timeout));
        }
        if !options.wait.in_range() {
            return Err(ClientError::WaitOutOfRange(options.wait));
        }
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        self.ensure_running()?;
        if options.num == 0 {
            return Ok(Vec::new());
        }

        let key = QueueKey::new(scope, queue);
        let wait = options.wait.as_duration();
        let mut deadline = self.clock().after(wait);
        let mut expired = wait.is_zero();

        // The lock is held only inside take_visible, never across the sleep
        loop {
            let taken = self.take_visible(&key, options).await?;
            if !taken.is_empty() || expired {
                return Ok(taken);
            }

            tracing::trace!(queue = %key, "queue empty, polling");
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ClientError::Cancelled),
                () = self.shared.scheduler.stopped() => return Err(ClientError::Shutdown),
                () = &mut deadline => expired = true,
                () = self.clock().sleep(self.shared.config.poll_interval) => {}
            }
        }
    }

    async fn delete_reserved(
        &self,
        cancel: &CancellationToken,
        scope: &str,
        queue: &str,
        message_id: MessageId,
        reservation_id: &ReservationId,
    ) -> Result<Deleted, ClientError> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        self.ensure_running()?;

        let reservation = self
            .shared
            .store
            .lock()
            .await
            .delete_reserved(message_id, reservation_id)?;

        // Reservation tokens are unique across queues, so the queue named by
        // the caller is only informational
        tracing::debug!(
            scope,
            queue,
            reserved_in = %reservation.queue,
            %message_id,
            %reservation_id,
            "reserved message deleted"
        );
        Ok(Deleted {
            msg: DELETED_MSG.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
