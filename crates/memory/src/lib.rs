// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mq-memory: in-process queue engine
//!
//! [`MemClient`] keeps every queue and reservation in memory and drives
//! delayed visibility and reservation expiry from an injectable clock, so
//! tests can step through message lifecycles without real time passing.

pub mod config;
mod engine;
mod scheduler;
mod store;

pub use config::{ConfigError, EngineConfig};
pub use engine::MemClient;
pub use store::{QueueKey, Reservation};
