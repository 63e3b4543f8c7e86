// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mq-core: shared vocabulary for message-queue clients
//!
//! This crate provides:
//! - The [`Client`] contract and its message types
//! - A clock abstraction with a controllable fake for tests
//! - A mutex that reports lock/unlock events, for synchronizing tests with
//!   background tasks
//! - A tracing wrapper for any client

pub mod clock;
pub mod id;
pub mod sync;

pub mod client;
pub mod error;
pub mod message;
pub mod traced;

// Re-exports
pub use client::{Client, Deleted, Enqueued};
pub use clock::{Alarm, Clock, FakeClock, SystemClock};
pub use error::{ClientError, ErrorKind};
pub use id::{IdGen, MessageId, ReservationId, SequentialIdGen, UuidIdGen};
pub use message::{DequeueOptions, Message, NewMessage, Timeout, Wait, MAX_DELAY};
pub use sync::{Notification, NotifyingGuard, NotifyingMutex};
pub use traced::TracedClient;
pub use tokio_util::sync::CancellationToken;
