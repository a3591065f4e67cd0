//! Event builders and field-by-field comparison.

use std::sync::Arc;

use gateway_events::{CborValueSerializer, GatewayEvent, ListenerOperation};

use super::record::FakeRecord;

pub fn initialized(operation: ListenerOperation, record: FakeRecord) -> GatewayEvent {
    GatewayEvent::new_initialized(operation, Arc::new(record), None, &CborValueSerializer)
        .unwrap_or_else(|e| panic!("initialize failed: {e}"))
}

pub fn update(thread_id: i64, sequence_id: i64, key: &str, value: &'static [u8]) -> GatewayEvent {
    initialized(
        ListenerOperation::AfterUpdate,
        FakeRecord::new(thread_id, sequence_id)
            .key(Some(key.into()))
            .serialized_value(value),
    )
}

/// Every field the wire record carries.
pub fn assert_same_record(left: &GatewayEvent, right: &GatewayEvent) {
    assert_eq!(left.identity(), right.identity(), "identity");
    assert_eq!(left.action(), right.action(), "action");
    assert_eq!(left.number_of_parts(), right.number_of_parts(), "parts");
    assert_eq!(left.region_path(), right.region_path(), "region");
    assert_eq!(left.value_is_object(), right.value_is_object(), "value flag");
    assert_eq!(left.key(), right.key(), "key");
    assert_eq!(left.value(), right.value(), "value");
    assert_eq!(
        left.sender_callback_argument(),
        right.sender_callback_argument(),
        "callback"
    );
    assert_eq!(
        left.possible_duplicate(),
        right.possible_duplicate(),
        "possible duplicate"
    );
    assert_eq!(left.creation_time_ms(), right.creation_time_ms(), "created");
    assert_eq!(left.bucket_id(), right.bucket_id(), "bucket");
    assert_eq!(left.shadow_key(), right.shadow_key(), "shadow key");
    assert_eq!(
        left.version_timestamp(),
        right.version_timestamp(),
        "version timestamp"
    );
}
