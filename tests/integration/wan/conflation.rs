use bytes::Bytes;

use gateway_events::config::ConflationConfig;
use gateway_events::wan::{EnqueueOutcome, encode_initialized};
use gateway_events::{ConflatingQueue, GatewayEvent, ListenerOperation, Value, decode_event};

use crate::fixtures::events::{initialized, update};
use crate::fixtures::record::FakeRecord;

fn values(queue: &ConflatingQueue<GatewayEvent>) -> Vec<Option<Bytes>> {
    queue.iter().map(|event| event.value().cloned()).collect()
}

#[test]
fn later_update_replaces_queued_value_in_place() {
    let mut queue = ConflatingQueue::new(ConflationConfig::default());
    let first = update(1, 1, "k1", b"v1");
    let first_identity = first.identity().clone();
    queue.enqueue(first);
    queue.enqueue(update(1, 2, "k2", b"other"));
    let outcome = queue.enqueue(update(1, 3, "k1", b"v3"));

    assert_eq!(outcome, EnqueueOutcome::Conflated { position: 0 });
    assert_eq!(queue.len(), 2);
    assert_eq!(
        values(&queue),
        vec![
            Some(Bytes::from_static(b"v3")),
            Some(Bytes::from_static(b"other"))
        ]
    );
    let head = queue.pop().expect("head");
    assert_eq!(head.identity(), &first_identity);
}

#[test]
fn creates_and_destroys_are_never_conflated() {
    let mut queue = ConflatingQueue::new(ConflationConfig::default());
    queue.enqueue(initialized(
        ListenerOperation::AfterCreate,
        FakeRecord::new(1, 1).serialized_value(&b"c"[..]),
    ));
    queue.enqueue(initialized(ListenerOperation::AfterDestroy, FakeRecord::new(1, 2)));
    queue.enqueue(initialized(
        ListenerOperation::TimestampUpdate,
        FakeRecord::new(1, 3),
    ));
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.conflated_count(), 0);
}

#[test]
fn destroy_between_updates_keeps_both_updates() {
    let mut queue = ConflatingQueue::new(ConflationConfig::default());
    queue.enqueue(update(1, 1, "k", b"before"));
    queue.enqueue(initialized(
        ListenerOperation::AfterDestroy,
        FakeRecord::new(1, 2).key(Some("k".into())),
    ));
    let outcome = queue.enqueue(update(1, 3, "k", b"after"));
    assert_eq!(outcome, EnqueueOutcome::Appended { position: 2 });
    assert_eq!(queue.len(), 3);
}

#[test]
fn same_key_in_other_region_is_separate() {
    let mut queue = ConflatingQueue::new(ConflationConfig::default());
    queue.enqueue(update(1, 1, "k", b"a"));
    queue.enqueue(initialized(
        ListenerOperation::AfterUpdate,
        FakeRecord::new(1, 2)
            .region("/elsewhere")
            .key(Some("k".into()))
            .serialized_value(&b"b"[..]),
    ));
    assert_eq!(queue.len(), 2);
}

#[test]
fn rehydrated_updates_conflate_like_local_ones() {
    let mut queue = ConflatingQueue::new(ConflationConfig::default());
    let spilled = update(2, 1, "k", b"old");
    let bytes = encode_initialized(&spilled).expect("encode");
    queue.enqueue(decode_event(&bytes).expect("decode"));
    let outcome = queue.enqueue(update(2, 2, "k", b"new"));
    assert_eq!(outcome, EnqueueOutcome::Conflated { position: 0 });
    assert_eq!(values(&queue), vec![Some(Bytes::from_static(b"new"))]);
}

#[test]
fn disabled_config_turns_conflation_off() {
    let mut queue = ConflatingQueue::new(ConflationConfig { enabled: false });
    queue.enqueue(update(1, 1, "k", b"a"));
    queue.enqueue(update(1, 2, "k", b"b"));
    assert_eq!(queue.len(), 2);
}

fn pending_update(sequence_id: i64, key: &str) -> GatewayEvent {
    GatewayEvent::new(
        ListenerOperation::AfterUpdate,
        FakeRecord::new(3, sequence_id)
            .key(Some(key.into()))
            .serialized_value(&b"pending"[..])
            .into_arc(),
        None,
    )
    .expect("new")
}

fn raw_update(sequence_id: i64, key: &str, raw: &'static [u8]) -> GatewayEvent {
    initialized(
        ListenerOperation::AfterUpdate,
        FakeRecord::new(4, sequence_id)
            .key(Some(key.into()))
            .raw_value(Some(Value::Bytes(Bytes::from_static(raw)))),
    )
}

fn null_update(sequence_id: i64, key: &str) -> GatewayEvent {
    initialized(
        ListenerOperation::AfterUpdate,
        FakeRecord::new(4, sequence_id).key(Some(key.into())),
    )
}

#[test]
fn uninitialized_updates_to_different_keys_stay_separate() {
    let mut queue = ConflatingQueue::new(ConflationConfig::default());
    queue.enqueue(pending_update(1, "a"));
    let outcome = queue.enqueue(pending_update(2, "b"));
    assert_eq!(outcome, EnqueueOutcome::Appended { position: 1 });
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.conflated_count(), 0);
}

#[test]
fn uninitialized_update_never_overwrites_a_queued_value() {
    let mut queue = ConflatingQueue::new(ConflationConfig::default());
    queue.enqueue(update(1, 1, "a", b"kept"));
    queue.enqueue(pending_update(2, "a"));
    let outcome = queue.enqueue(update(1, 3, "a", b"later"));

    assert_eq!(outcome, EnqueueOutcome::Appended { position: 2 });
    assert_eq!(
        queue.peek().and_then(|event| event.value().cloned()),
        Some(Bytes::from_static(b"kept"))
    );
}

#[test]
fn conflated_null_over_raw_bytes_still_round_trips() {
    let mut queue = ConflatingQueue::new(ConflationConfig::default());
    queue.enqueue(raw_update(1, "k", b"raw"));
    queue.enqueue(null_update(2, "k"));

    let head = queue.pop().expect("head");
    assert_eq!(head.value(), None);
    assert!(head.value_is_object());
    let bytes = encode_initialized(&head).expect("encode");
    let decoded = decode_event(&bytes).expect("decode");
    assert_eq!(decoded.value(), None);
    assert!(decoded.value_is_object());
}

#[test]
fn conflation_relabels_raw_and_object_values() {
    let mut queue = ConflatingQueue::new(ConflationConfig::default());
    queue.enqueue(raw_update(1, "k", b"raw"));
    queue.enqueue(update(4, 2, "k", b"object"));
    let head = queue.peek().expect("head");
    assert!(head.value_is_object());
    assert_eq!(head.value(), Some(&Bytes::from_static(b"object")));

    queue.enqueue(raw_update(3, "k", b"raw again"));
    let head = queue.pop().expect("head");
    assert!(!head.value_is_object());
    let decoded = decode_event(&encode_initialized(&head).expect("encode")).expect("decode");
    assert!(!decoded.value_is_object());
    assert_eq!(decoded.value(), Some(&Bytes::from_static(b"raw again")));
}
