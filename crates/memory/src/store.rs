// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Visible queues and the reservation table
//!
//! A message lives in exactly one place: a queue's visible sequence, the
//! reservation table, or (while delayed) a scheduler task. The store is
//! only ever touched while its [`NotifyingMutex`](mq_core::NotifyingMutex)
//! is held.
//!
//! Each visible entry carries the [`Due`] stamp of the moment it became
//! visible. Tasks woken by the same clock step may reach the lock in any
//! order, so insertion keeps the sequence sorted by that stamp.

use mq_core::{ClientError, Message, MessageId, ReservationId};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Instant;

/// Identifies a queue: a name within an owning scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueKey {
    pub scope: String,
    pub name: String,
}

impl QueueKey {
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QueueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope, self.name)
    }
}

/// When a message became visible: a clock instant, ties broken by the
/// order in which visibility was scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Due {
    pub at: Instant,
    pub seq: u64,
}

#[derive(Debug)]
struct Visible {
    due: Due,
    message: Message,
}

/// A message checked out by a consumer
#[derive(Debug, Clone)]
pub struct Reservation {
    pub id: ReservationId,
    pub queue: QueueKey,
    pub message: Message,
    pub expires_at: Instant,
}

#[derive(Debug, Default)]
pub(crate) struct Store {
    queues: HashMap<QueueKey, VecDeque<Visible>>,
    reservations: HashMap<ReservationId, Reservation>,
}

impl Store {
    /// Visible messages of a queue, head first; empty for unknown queues
    pub fn visible(&self, key: &QueueKey) -> impl Iterator<Item = &Message> {
        self.queues
            .get(key)
            .into_iter()
            .flatten()
            .map(|visible| &visible.message)
    }

    pub fn visible_len(&self, key: &QueueKey) -> usize {
        self.queues.get(key).map_or(0, VecDeque::len)
    }

    /// Insert behind every message that became visible no later than `due`.
    ///
    /// Arrivals in `due` order append to the tail.
    pub fn push_visible(&mut self, key: &QueueKey, message: Message, due: Due) {
        let queue = self.queues.entry(key.clone()).or_default();
        let at = queue
            .iter()
            .rposition(|visible| visible.due <= due)
            .map_or(0, |i| i + 1);
        queue.insert(at, Visible { due, message });
    }

    /// Remove up to `max` messages from the head of the queue
    pub fn pop_visible(&mut self, key: &QueueKey, max: usize) -> Vec<Message> {
        let Some(queue) = self.queues.get_mut(key) else {
            return Vec::new();
        };
        let count = max.min(queue.len());
        queue.drain(..count).map(|visible| visible.message).collect()
    }

    pub fn reserve(&mut self, reservation: Reservation) {
        self.reservations.insert(reservation.id.clone(), reservation);
    }

    pub fn reservation(&self, id: &ReservationId) -> Option<&Reservation> {
        self.reservations.get(id)
    }

    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    /// Return an expired reservation's message to its queue, visible as of
    /// `due`.
    ///
    /// Returns `None` when the reservation no longer exists (already
    /// deleted), in which case nothing changes.
    pub fn requeue_expired(
        &mut self,
        id: &ReservationId,
        due: Due,
    ) -> Option<(QueueKey, MessageId)> {
        let Reservation {
            queue, mut message, ..
        } = self.reservations.remove(id)?;
        message.reservation_id = None;
        let message_id = message.id;
        self.push_visible(&queue, message, due);
        Some((queue, message_id))
    }

    /// Permanently remove a reservation.
    ///
    /// Fails without changing anything if the token is unknown or reserves a
    /// different message.
    pub fn delete_reserved(
        &mut self,
        message_id: MessageId,
        id: &ReservationId,
    ) -> Result<Reservation, ClientError> {
        let reserved = self
            .reservations
            .get(id)
            .ok_or_else(|| ClientError::NoSuchReservation(id.clone()))?;
        if reserved.message.id != message_id {
            return Err(ClientError::NoSuchMessage {
                message_id,
                reservation_id: id.clone(),
            });
        }
        self.reservations
            .remove(id)
            .ok_or_else(|| ClientError::NoSuchReservation(id.clone()))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
