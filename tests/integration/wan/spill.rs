use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use gateway_events::wan::{DEFAULT_MAX_SPILL_FRAME_BYTES, SpillFrameError, SpillReader, SpillWriter};
use gateway_events::{CborValueSerializer, GatewayEvent, ListenerOperation, Value};

use crate::fixtures::events::{assert_same_record, initialized, update};
use crate::fixtures::record::FakeRecord;

#[test]
fn spilled_events_read_back_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("queue.spill");

    let published = vec![
        update(1, 1, "a", b"one"),
        initialized(ListenerOperation::AfterDestroy, FakeRecord::new(1, 2)),
        update(1, 3, "b", b"three"),
    ];
    let mut lazy = GatewayEvent::new(
        ListenerOperation::AfterCreate,
        FakeRecord::new(1, 4)
            .raw_value(Some(Value::Long(4)))
            .into_arc(),
        None,
    )
    .expect("new");

    {
        let file = File::create(&path).expect("create");
        let mut writer = SpillWriter::new(BufWriter::new(file), DEFAULT_MAX_SPILL_FRAME_BYTES);
        for event in &published {
            writer.append_initialized(event).expect("append");
        }
        writer.append(&mut lazy, &CborValueSerializer).expect("append lazy");
        writer.flush().expect("flush");
    }

    let reader = SpillReader::new(
        BufReader::new(File::open(&path).expect("open")),
        DEFAULT_MAX_SPILL_FRAME_BYTES,
    );
    let restored: Vec<GatewayEvent> = reader
        .collect::<Result<_, _>>()
        .expect("read back");
    assert_eq!(restored.len(), 4);
    for (original, restored) in published.iter().chain([&lazy]).zip(&restored) {
        assert_same_record(original, restored);
    }
}

#[test]
fn torn_tail_is_reported_after_good_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("torn.spill");
    {
        let mut writer = SpillWriter::new(File::create(&path).expect("create"), 1024);
        writer
            .append_initialized(&update(1, 1, "a", b"one"))
            .expect("append");
        writer
            .append_initialized(&update(1, 2, "b", b"two"))
            .expect("append");
    }
    let len = std::fs::metadata(&path).expect("metadata").len();
    OpenOptions::new()
        .write(true)
        .open(&path)
        .expect("open")
        .set_len(len - 5)
        .expect("truncate");

    let mut reader = SpillReader::new(File::open(&path).expect("open"), 1024);
    assert!(reader.next_event().expect("first").is_some());
    assert!(matches!(
        reader.next_event().unwrap_err(),
        SpillFrameError::Torn { part: "body" }
    ));
}
