// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling
//!
//! Everything time-dependent in the queue engine (message delay, dequeue
//! wait, reservation timeout) goes through a [`Clock`], so tests can drive
//! hours of queue behavior by advancing a [`FakeClock`].

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Notify};

/// A clock that provides the current time and timers on its own timeline
#[async_trait]
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;

    /// Returns an alarm that fires once `duration` has elapsed.
    ///
    /// The deadline is fixed when `after` is called, not when the alarm is
    /// first polled.
    fn after(&self, duration: Duration) -> Alarm;

    /// Suspend the caller until `duration` has elapsed on this clock
    async fn sleep(&self, duration: Duration) {
        self.after(duration).await
    }
}

/// One-shot timer signal returned by [`Clock::after`]
#[must_use = "alarms do nothing unless awaited"]
pub struct Alarm {
    state: AlarmState,
}

enum AlarmState {
    Fired,
    Timer(Pin<Box<tokio::time::Sleep>>),
    Signal(oneshot::Receiver<()>),
}

impl Alarm {
    /// An alarm that has already gone off
    pub fn fired() -> Self {
        Self {
            state: AlarmState::Fired,
        }
    }
}

impl Future for Alarm {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let ready = match &mut self.state {
            AlarmState::Fired => return Poll::Ready(()),
            AlarmState::Timer(sleep) => sleep.as_mut().poll(cx).is_ready(),
            // A closed channel means the clock went away; nothing can fire it later.
            AlarmState::Signal(rx) => Pin::new(rx).poll(cx).is_ready(),
        };
        if ready {
            self.state = AlarmState::Fired;
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

impl std::fmt::Debug for Alarm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            AlarmState::Fired => "fired",
            AlarmState::Timer(_) => "timer",
            AlarmState::Signal(_) => "signal",
        };
        f.debug_struct("Alarm").field("state", &state).finish()
    }
}

/// Real system clock
///
/// Alarms are tokio timers, so `after` must be called from within a tokio
/// runtime.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn after(&self, duration: Duration) -> Alarm {
        if duration.is_zero() {
            return Alarm::fired();
        }
        Alarm {
            state: AlarmState::Timer(Box::pin(tokio::time::sleep(duration))),
        }
    }
}

/// Fake clock for testing with controllable time
///
/// Time only moves when [`FakeClock::advance`] is called. Advancing fires
/// every pending alarm whose deadline was reached, earliest first, before
/// `advance` returns.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<FakeClockInner>,
}

struct FakeClockInner {
    state: Mutex<FakeClockState>,
    registered: Notify,
}

struct FakeClockState {
    current: Instant,
    next_seq: u64,
    pending: BinaryHeap<PendingAlarm>,
}

struct PendingAlarm {
    deadline: Instant,
    seq: u64,
    tx: oneshot::Sender<()>,
}

impl PartialEq for PendingAlarm {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for PendingAlarm {}

impl PartialOrd for PendingAlarm {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingAlarm {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: earliest deadline first, then registration order
        other
            .deadline
            .cmp(&self.deadline)
            .then(other.seq.cmp(&self.seq))
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(FakeClockInner {
                state: Mutex::new(FakeClockState {
                    current: Instant::now(),
                    next_seq: 0,
                    pending: BinaryHeap::new(),
                }),
                registered: Notify::new(),
            }),
        }
    }

    /// Advance the clock by the given duration, firing every alarm that
    /// became due
    pub fn advance(&self, duration: Duration) {
        let due = {
            let mut state = self.lock_state();
            state.current += duration;
            let now = state.current;

            let mut due = Vec::new();
            while state.pending.peek().is_some_and(|p| p.deadline <= now) {
                if let Some(alarm) = state.pending.pop() {
                    due.push(alarm);
                }
            }
            due
        };

        for alarm in due {
            // The receiver may have been dropped; that's fine
            let _ = alarm.tx.send(());
        }
    }

    /// Number of alarms registered and still awaited
    pub fn pending(&self) -> usize {
        self.lock_state()
            .pending
            .iter()
            .filter(|p| !p.tx.is_closed())
            .count()
    }

    /// Wait until at least `count` alarms are pending.
    ///
    /// Use this before advancing when the code under test registers its
    /// alarm from a background task.
    pub async fn wait_for_pending(&self, count: usize) {
        loop {
            let registered = self.inner.registered.notified();
            if self.pending() >= count {
                return;
            }
            registered.await;
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, FakeClockState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.lock_state().current
    }

    fn after(&self, duration: Duration) -> Alarm {
        if duration.is_zero() {
            return Alarm::fired();
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.lock_state();
            let deadline = state.current + duration;
            let seq = state.next_seq;
            state.next_seq += 1;
            state.pending.push(PendingAlarm { deadline, seq, tx });
        }
        self.inner.registered.notify_waiters();

        Alarm {
            state: AlarmState::Signal(rx),
        }
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
