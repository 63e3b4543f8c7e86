// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors returned by queue clients

use crate::id::{MessageId, ReservationId};
use crate::message::{Timeout, Wait};
use thiserror::Error;

/// Errors from queue operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("timeout {0} out of range [{min}, {max}]", min = Timeout::MIN, max = Timeout::MAX)]
    TimeoutOutOfRange(Timeout),
    #[error("wait {0} out of range [{min}, {max}]", min = Wait::MIN, max = Wait::MAX)]
    WaitOutOfRange(Wait),
    #[error("delay {delay} exceeds maximum of {max} seconds")]
    DelayOutOfRange { delay: u32, max: u32 },
    #[error("no such reservation: {0}")]
    NoSuchReservation(ReservationId),
    #[error("no such message: {message_id} is not reserved by {reservation_id}")]
    NoSuchMessage {
        message_id: MessageId,
        reservation_id: ReservationId,
    },
    #[error("cancelled")]
    Cancelled,
    #[error("queue engine is shut down")]
    Shutdown,
}

/// Broad classes of [`ClientError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, rejected before any state changed
    Validation,
    /// Unknown reservation or message
    NotFound,
    /// The caller cancelled the operation
    Cancelled,
    /// The engine no longer accepts operations
    Shutdown,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::TimeoutOutOfRange(_)
            | ClientError::WaitOutOfRange(_)
            | ClientError::DelayOutOfRange { .. } => ErrorKind::Validation,
            ClientError::NoSuchReservation(_) | ClientError::NoSuchMessage { .. } => {
                ErrorKind::NotFound
            }
            ClientError::Cancelled => ErrorKind::Cancelled,
            ClientError::Shutdown => ErrorKind::Shutdown,
        }
    }

    /// Whether repeating the same call could succeed; only a cancelled call
    /// is worth repeating as-is
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}
