//! In-memory mutation record with a touch counter.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use uuid::Uuid;

use gateway_events::{
    CallbackArgument, EventIdentity, MembershipId, MutationRecord, OperationFlags, Value,
    VersionTag,
};

pub const MEMBER_BYTES: [u8; 16] = [0xA5; 16];

pub fn member() -> MembershipId {
    MembershipId::from_uuid(Uuid::from_bytes(MEMBER_BYTES))
}

/// Every accessor `initialize` reads bumps `touches`.
#[derive(Debug)]
pub struct FakeRecord {
    identity: Option<EventIdentity>,
    region: String,
    possible_duplicate: bool,
    key: Option<Value>,
    serialized: Option<Bytes>,
    cached: Mutex<Option<Bytes>>,
    raw: Option<Value>,
    callback: Option<CallbackArgument>,
    flags: OperationFlags,
    version_tag: Option<VersionTag>,
    sequence: i64,
    touches: AtomicUsize,
}

impl FakeRecord {
    pub fn new(thread_id: i64, sequence_id: i64) -> Self {
        Self {
            identity: Some(EventIdentity::new(member(), thread_id, sequence_id)),
            region: "/orders".to_string(),
            possible_duplicate: false,
            key: Some(Value::from("order-1")),
            serialized: None,
            cached: Mutex::new(None),
            raw: None,
            callback: None,
            flags: OperationFlags::default(),
            version_tag: None,
            sequence: -1,
            touches: AtomicUsize::new(0),
        }
    }

    pub fn without_identity(mut self) -> Self {
        self.identity = None;
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.region = region.to_string();
        self
    }

    pub fn key(mut self, key: Option<Value>) -> Self {
        self.key = key;
        self
    }

    pub fn raw_value(mut self, value: Option<Value>) -> Self {
        self.raw = value;
        self
    }

    pub fn serialized_value(mut self, bytes: impl Into<Bytes>) -> Self {
        self.serialized = Some(bytes.into());
        self
    }

    pub fn callback(mut self, arg: CallbackArgument) -> Self {
        self.callback = Some(arg);
        self
    }

    pub fn flags(mut self, flags: OperationFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn version_timestamp(mut self, ts: u64) -> Self {
        self.version_tag = Some(VersionTag {
            version_timestamp: ts,
        });
        self
    }

    pub fn possible_duplicate(mut self) -> Self {
        self.possible_duplicate = true;
        self
    }

    pub fn sequence(mut self, sequence: i64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn into_arc(self) -> Arc<FakeRecord> {
        Arc::new(self)
    }

    pub fn touches(&self) -> usize {
        self.touches.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.touches.fetch_add(1, Ordering::SeqCst);
    }
}

impl MutationRecord for FakeRecord {
    fn event_identity(&self) -> Option<EventIdentity> {
        self.identity.clone()
    }

    fn region_path(&self) -> String {
        self.region.clone()
    }

    fn is_possible_duplicate(&self) -> bool {
        self.possible_duplicate
    }

    fn key(&self) -> Option<Value> {
        self.touch();
        self.key.clone()
    }

    fn serialized_new_value(&self) -> Option<Bytes> {
        self.touch();
        self.serialized.clone()
    }

    fn cached_serialized_new_value(&self) -> Option<Bytes> {
        self.touch();
        self.cached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn raw_new_value(&self) -> Option<Value> {
        self.touch();
        self.raw.clone()
    }

    fn raw_callback_argument(&self) -> Option<CallbackArgument> {
        self.touch();
        self.callback.clone()
    }

    fn operation_flags(&self) -> OperationFlags {
        self.touch();
        self.flags
    }

    fn version_tag(&self) -> Option<VersionTag> {
        self.version_tag
    }

    fn assigned_sequence_number(&self) -> i64 {
        self.touch();
        self.sequence
    }

    fn cache_serialized_new_value(&self, bytes: Bytes) {
        *self
            .cached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(bytes);
    }
}
