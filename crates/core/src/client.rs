// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The queue client contract
//!
//! Both the in-memory engine and a network-backed client implement
//! [`Client`], so code written against the trait can be tested without a
//! live service.

use crate::error::ClientError;
use crate::id::{MessageId, ReservationId};
use crate::message::{DequeueOptions, Message, NewMessage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Result of an enqueue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enqueued {
    /// IDs of the enqueued messages, in input order
    pub ids: Vec<MessageId>,
    /// Status reported for the operation
    pub msg: String,
}

/// Result of deleting a reserved message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub msg: String,
}

/// Operations on a hosted message queue.
///
/// Queues are addressed by `scope` (the owning project) and `queue` name.
/// Every operation returns [`ClientError::Cancelled`] when `cancel` has
/// fired. A cancelled operation may already have applied part of its effect
/// (messages enqueued, reserved or discarded); implementations do not roll
/// that back, so callers must treat operations as at-least-once.
#[async_trait]
pub trait Client: Send + Sync + 'static {
    /// Enqueue `messages`. Messages with a delay become visible only once
    /// their delay has elapsed.
    async fn enqueue(
        &self,
        cancel: &CancellationToken,
        scope: &str,
        queue: &str,
        messages: Vec<NewMessage>,
    ) -> Result<Enqueued, ClientError>;

    /// Take up to `options.num` messages, waiting up to `options.wait` for
    /// any to become visible.
    ///
    /// Returns as soon as at least one message is available; an empty `Vec`
    /// means the wait elapsed with nothing to hand out. Unless
    /// `options.delete` is set, each message is reserved and returns to the
    /// queue if not deleted within `options.timeout`.
    async fn dequeue(
        &self,
        cancel: &CancellationToken,
        scope: &str,
        queue: &str,
        options: DequeueOptions,
    ) -> Result<Vec<Message>, ClientError>;

    /// Permanently delete a reserved message.
    ///
    /// The reservation token is the key; `message_id` must match the message
    /// it reserves.
    async fn delete_reserved(
        &self,
        cancel: &CancellationToken,
        scope: &str,
        queue: &str,
        message_id: MessageId,
        reservation_id: &ReservationId,
    ) -> Result<Deleted, ClientError>;
}
