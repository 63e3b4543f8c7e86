// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use mq_core::NewMessage;
use std::time::Duration;

fn key() -> QueueKey {
    QueueKey::new("proj", "jobs")
}

fn message(id: u64) -> Message {
    Message::new(MessageId(id), NewMessage::new(format!("body-{id}")))
}

/// Stamp `secs` after a shared origin, with the message ID as tie-break
fn due_at(origin: Instant, secs: u64, seq: u64) -> Due {
    Due {
        at: origin + Duration::from_secs(secs),
        seq,
    }
}

/// Push in arrival order, each message visible as of now
fn push(store: &mut Store, key: &QueueKey, id: u64) {
    store.push_visible(key, message(id), due_at(Instant::now(), 0, id));
}

fn reserve(store: &mut Store, id: u64, token: &str) -> ReservationId {
    let token = ReservationId::new(token);
    let mut message = message(id);
    message.reserved_count = 1;
    message.reservation_id = Some(token.clone());
    store.reserve(Reservation {
        id: token.clone(),
        queue: key(),
        message,
        expires_at: Instant::now() + Duration::from_secs(30),
    });
    token
}

fn visible_ids(store: &Store, key: &QueueKey) -> Vec<u64> {
    store.visible(key).map(|m| m.id.0).collect()
}

#[test]
fn unknown_queue_is_empty() {
    let store = Store::default();
    assert_eq!(store.visible_len(&key()), 0);
    assert_eq!(store.visible(&key()).count(), 0);
}

#[test]
fn pop_on_unknown_queue_returns_nothing() {
    let mut store = Store::default();
    assert!(store.pop_visible(&key(), 5).is_empty());
}

#[test]
fn queues_are_isolated_by_scope_and_name() {
    let mut store = Store::default();
    let other_scope = QueueKey::new("other", "jobs");
    let other_name = QueueKey::new("proj", "mail");

    push(&mut store, &key(), 1);
    push(&mut store, &other_scope, 2);
    push(&mut store, &other_name, 3);

    assert_eq!(visible_ids(&store, &key()), vec![1]);
    assert_eq!(visible_ids(&store, &other_scope), vec![2]);
    assert_eq!(visible_ids(&store, &other_name), vec![3]);
}

#[test]
fn pop_takes_from_head_up_to_max() {
    let mut store = Store::default();
    for id in 1..=4 {
        push(&mut store, &key(), id);
    }

    let popped: Vec<u64> = store.pop_visible(&key(), 3).iter().map(|m| m.id.0).collect();
    assert_eq!(popped, vec![1, 2, 3]);
    assert_eq!(visible_ids(&store, &key()), vec![4]);
}

#[test]
fn requeue_expired_moves_message_to_tail() {
    let mut store = Store::default();
    push(&mut store, &key(), 2);
    let token = reserve(&mut store, 1, "r-1");

    let requeued = store.requeue_expired(&token, due_at(Instant::now(), 30, 3));

    assert_eq!(requeued, Some((key(), MessageId(1))));
    assert_eq!(store.reservation_count(), 0);
    assert_eq!(visible_ids(&store, &key()), vec![2, 1]);

    let back = store.visible(&key()).last().unwrap();
    assert!(back.reservation_id.is_none());
    assert_eq!(back.reserved_count, 1);
}

#[test]
fn requeue_of_deleted_reservation_is_noop() {
    let mut store = Store::default();
    let token = reserve(&mut store, 1, "r-1");
    store.delete_reserved(MessageId(1), &token).unwrap();

    assert_eq!(store.requeue_expired(&token, due_at(Instant::now(), 30, 2)), None);
    assert_eq!(store.visible_len(&key()), 0);
}

#[test]
fn late_arrival_is_placed_by_due_stamp() {
    let mut store = Store::default();
    let origin = Instant::now();
    store.push_visible(&key(), message(1), due_at(origin, 0, 1));
    store.push_visible(&key(), message(3), due_at(origin, 2, 3));
    // Became visible at 1s but reached the store after the 2s message
    store.push_visible(&key(), message(2), due_at(origin, 1, 2));

    assert_eq!(visible_ids(&store, &key()), vec![1, 2, 3]);
}

#[test]
fn equal_instants_keep_scheduling_order() {
    let mut store = Store::default();
    let origin = Instant::now();
    store.push_visible(&key(), message(2), due_at(origin, 5, 2));
    store.push_visible(&key(), message(1), due_at(origin, 5, 1));
    store.push_visible(&key(), message(3), due_at(origin, 5, 3));

    assert_eq!(visible_ids(&store, &key()), vec![1, 2, 3]);
}

#[test]
fn requeue_lands_before_later_visibility() {
    let mut store = Store::default();
    let origin = Instant::now();
    let token = reserve(&mut store, 1, "r-1");
    store.push_visible(&key(), message(2), due_at(origin, 40, 2));

    store.requeue_expired(&token, due_at(origin, 30, 3));

    assert_eq!(visible_ids(&store, &key()), vec![1, 2]);
}

#[test]
fn delete_reserved_removes_permanently() {
    let mut store = Store::default();
    let token = reserve(&mut store, 7, "r-7");

    let deleted = store.delete_reserved(MessageId(7), &token).unwrap();
    assert_eq!(deleted.message.id, MessageId(7));
    assert!(store.reservation(&token).is_none());

    let again = store.delete_reserved(MessageId(7), &token).unwrap_err();
    assert_eq!(again, ClientError::NoSuchReservation(token));
}

#[test]
fn delete_with_wrong_message_keeps_reservation() {
    let mut store = Store::default();
    let token = reserve(&mut store, 7, "r-7");

    let err = store.delete_reserved(MessageId(8), &token).unwrap_err();
    assert_eq!(
        err,
        ClientError::NoSuchMessage {
            message_id: MessageId(8),
            reservation_id: token.clone(),
        }
    );
    assert!(store.reservation(&token).is_some());
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn pops_preserve_enqueue_order(
            count in 0..40u64,
            batches in proptest::collection::vec(1..6usize, 1..20),
        ) {
            let mut store = Store::default();
            for id in 1..=count {
                push(&mut store, &key(), id);
            }

            let mut drained = Vec::new();
            for max in batches {
                drained.extend(store.pop_visible(&key(), max).into_iter().map(|m| m.id.0));
            }
            drained.extend(store.pop_visible(&key(), usize::MAX).into_iter().map(|m| m.id.0));

            prop_assert_eq!(drained, (1..=count).collect::<Vec<_>>());
        }

        #[test]
        fn queue_is_sorted_by_due_whatever_the_arrival_order(
            offsets in proptest::collection::vec(0..10u64, 1..30),
        ) {
            let mut store = Store::default();
            let origin = Instant::now();
            for (seq, secs) in offsets.iter().enumerate() {
                let seq = seq as u64;
                store.push_visible(&key(), message(seq), due_at(origin, *secs, seq));
            }

            let mut expected: Vec<(u64, u64)> = offsets
                .iter()
                .enumerate()
                .map(|(seq, secs)| (*secs, seq as u64))
                .collect();
            expected.sort();
            let expected: Vec<u64> = expected.into_iter().map(|(_, seq)| seq).collect();

            prop_assert_eq!(visible_ids(&store, &key()), expected);
        }
    }
}
