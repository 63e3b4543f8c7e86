// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced client wrapper for consistent observability

use crate::client::{Client, Deleted, Enqueued};
use crate::error::{ClientError, ErrorKind};
use crate::id::{MessageId, ReservationId};
use crate::message::{DequeueOptions, Message, NewMessage};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Wrapper that adds tracing to any Client
#[derive(Clone)]
pub struct TracedClient<C> {
    inner: C,
}

impl<C> TracedClient<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

fn log_failure(error: &ClientError, elapsed_ms: u64) {
    match error.kind() {
        ErrorKind::Cancelled => tracing::info!(elapsed_ms, "cancelled"),
        ErrorKind::NotFound => tracing::warn!(elapsed_ms, error = %error, "not found"),
        ErrorKind::Shutdown => tracing::warn!(elapsed_ms, "engine shut down"),
        ErrorKind::Validation => tracing::error!(elapsed_ms, error = %error, "rejected"),
    }
}

#[async_trait]
impl<C: Client> Client for TracedClient<C> {
    async fn enqueue(
        &self,
        cancel: &CancellationToken,
        scope: &str,
        queue: &str,
        messages: Vec<NewMessage>,
    ) -> Result<Enqueued, ClientError> {
        let span = tracing::info_span!("mq.enqueue", scope, queue);
        async {
            let delayed = messages.iter().filter(|m| m.delay > 0).count();
            tracing::info!(count = messages.len(), delayed, "enqueueing");

            let start = std::time::Instant::now();
            let result = self.inner.enqueue(cancel, scope, queue, messages).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(enqueued) => tracing::info!(elapsed_ms, ids = enqueued.ids.len(), "enqueued"),
                Err(e) => log_failure(e, elapsed_ms),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn dequeue(
        &self,
        cancel: &CancellationToken,
        scope: &str,
        queue: &str,
        options: DequeueOptions,
    ) -> Result<Vec<Message>, ClientError> {
        let span = tracing::info_span!(
            "mq.dequeue",
            scope,
            queue,
            num = options.num,
            timeout = options.timeout.0,
            wait = options.wait.0,
            delete = options.delete
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.dequeue(cancel, scope, queue, options).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(messages) if messages.is_empty() => {
                    tracing::debug!(elapsed_ms, "wait elapsed with no messages")
                }
                Ok(messages) => tracing::info!(elapsed_ms, count = messages.len(), "dequeued"),
                Err(e) => log_failure(e, elapsed_ms),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn delete_reserved(
        &self,
        cancel: &CancellationToken,
        scope: &str,
        queue: &str,
        message_id: MessageId,
        reservation_id: &ReservationId,
    ) -> Result<Deleted, ClientError> {
        let span = tracing::info_span!(
            "mq.delete_reserved",
            scope,
            queue,
            %message_id,
            %reservation_id
        );
        async {
            let start = std::time::Instant::now();
            let result = self
                .inner
                .delete_reserved(cancel, scope, queue, message_id, reservation_id)
                .await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(_) => tracing::info!(elapsed_ms, "deleted"),
                Err(e) => log_failure(e, elapsed_ms),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
