// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message types and dequeue parameters

use crate::id::{MessageId, ReservationId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Longest delay, in seconds, a message may be enqueued with (7 days)
pub const MAX_DELAY: u32 = 604_800;

/// A message to be enqueued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub body: String,
    /// Seconds until the message becomes visible
    #[serde(default)]
    pub delay: u32,
    #[serde(default)]
    pub push_headers: BTreeMap<String, String>,
}

impl NewMessage {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            delay: 0,
            push_headers: BTreeMap::new(),
        }
    }

    pub fn with_delay(self, delay: u32) -> Self {
        Self { delay, ..self }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_headers.insert(key.into(), value.into());
        self
    }
}

/// A message as held by the queue and handed out by dequeue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub body: String,
    #[serde(default)]
    pub push_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub delay: u32,
    /// Times this message has been dequeued
    #[serde(default)]
    pub reserved_count: u32,
    /// Set while the message is checked out; replaced on every dequeue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<ReservationId>,
}

impl Message {
    pub fn new(id: MessageId, new: NewMessage) -> Self {
        Self {
            id,
            body: new.body,
            push_headers: new.push_headers,
            delay: new.delay,
            reserved_count: 0,
            reservation_id: None,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.delay))
    }
}

/// Seconds until a reservation expires
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeout(pub u32);

impl Timeout {
    pub const MIN: Timeout = Timeout(30);
    pub const MAX: Timeout = Timeout(86_400);

    pub fn in_range(self) -> bool {
        (Self::MIN..=Self::MAX).contains(&self)
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seconds a dequeue may wait for messages to show up
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wait(pub u16);

impl Wait {
    pub const MIN: Wait = Wait(0);
    pub const MAX: Wait = Wait(30);

    pub fn in_range(self) -> bool {
        (Self::MIN..=Self::MAX).contains(&self)
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl fmt::Display for Wait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters of a dequeue call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DequeueOptions {
    /// Most messages to return
    #[serde(rename = "n")]
    pub num: usize,
    pub timeout: Timeout,
    pub wait: Wait,
    /// Discard messages instead of reserving them
    pub delete: bool,
}

impl DequeueOptions {
    pub fn new(num: usize) -> Self {
        Self {
            num,
            ..Self::default()
        }
    }

    pub fn timeout(self, secs: u32) -> Self {
        Self {
            timeout: Timeout(secs),
            ..self
        }
    }

    pub fn wait(self, secs: u16) -> Self {
        Self {
            wait: Wait(secs),
            ..self
        }
    }

    pub fn delete(self, delete: bool) -> Self {
        Self { delete, ..self }
    }
}

impl Default for DequeueOptions {
    fn default() -> Self {
        Self {
            num: 1,
            timeout: Timeout(60),
            wait: Wait(0),
            delete: false,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
