//! Gateway sender event: one cache mutation packaged for a remote site.
//!
//! An event is observed in one of three shapes:
//! - primary, in memory: built from a mutation record and initialized
//! - secondary, in memory: built from a mutation record, never initialized
//! - rehydrated from the wire or the overflow store: no listener operation
//!
//! [`Classification`] records which of these facts survived, so create /
//! update / destroy checks are a single match instead of null checks.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use thiserror::Error;

use crate::core::{
    Action, CallbackArgument, EventIdentity, ListenerOperation, MutationRecord, Operation,
    OperationDetail, SerdeContext, SerializeError, SubstituteValue, Value, ValueSerializer,
    WallClock,
};

/// Bucket id of events from non-partitioned regions.
pub const NO_BUCKET: i32 = -1;

/// Shadow key before the source assigned one.
pub const NO_SHADOW_KEY: i64 = -1;

#[derive(Debug, Error)]
pub enum GatewayEventError {
    #[error("no event identity is available for this gateway event")]
    IdentityMissing,
    #[error("failed to serialize value for region {region_path}: {source}")]
    Encoding {
        region_path: String,
        #[source]
        source: SerializeError,
    },
}

/// What an event's create/update/destroy classification is derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Built locally from a listener callback (primary or secondary copy).
    ByOperationKind(ListenerOperation),
    /// Rehydrated from bytes; only the wire action survived.
    ByAction(Action),
}

impl Classification {
    pub fn action(self) -> Action {
        match self {
            Classification::ByOperationKind(kind) => kind.action(),
            Classification::ByAction(action) => action,
        }
    }
}

#[derive(Debug)]
enum KeyState {
    /// Not initialized yet; holds the record the key and value come from.
    Pending(Arc<dyn MutationRecord>),
    /// Initialized. The record handle has been released.
    Resolved(Option<Value>),
}

/// Fields read back from an encoded event record.
pub(crate) struct WireFields {
    pub identity: EventIdentity,
    pub action: Action,
    pub region_path: String,
    pub value_is_object: bool,
    pub key: Option<Value>,
    pub value: Option<Bytes>,
    pub callback_argument: Option<CallbackArgument>,
    pub possible_duplicate: bool,
    pub creation_time_ms: u64,
    pub bucket_id: i32,
    pub shadow_key: i64,
    pub version_timestamp: u64,
}

/// A replicated mutation event.
///
/// Everything except the possible-duplicate, acked and dispatched flags is
/// written once, before the event is published to a queue. The flags are
/// atomics so the ack reader and the dispatcher can share a published event.
#[derive(Debug)]
pub struct GatewayEvent {
    identity: EventIdentity,
    classification: Classification,
    substitute_value: Option<SubstituteValue>,
    region_path: String,
    key: KeyState,
    value: Option<Bytes>,
    value_is_object: bool,
    callback_argument: Option<CallbackArgument>,
    operation_detail: OperationDetail,
    possible_duplicate: AtomicBool,
    creation_time_ms: u64,
    version_timestamp: u64,
    bucket_id: i32,
    shadow_key: i64,
    acked: AtomicBool,
    dispatched: AtomicBool,
}

impl GatewayEvent {
    /// Captures identity and the record's transient fields; key and value are
    /// resolved later by [`GatewayEvent::initialize`].
    pub fn new(
        operation: ListenerOperation,
        record: Arc<dyn MutationRecord>,
        substitute_value: Option<SubstituteValue>,
    ) -> Result<Self, GatewayEventError> {
        let identity = record
            .event_identity()
            .ok_or(GatewayEventError::IdentityMissing)?;
        let region_path = record.region_path();
        let possible_duplicate = record.is_possible_duplicate();
        let version_timestamp = record
            .version_tag()
            .map(|tag| tag.version_timestamp)
            .unwrap_or_default();

        Ok(Self {
            identity,
            classification: Classification::ByOperationKind(operation),
            substitute_value,
            region_path,
            key: KeyState::Pending(record),
            value: None,
            value_is_object: true,
            callback_argument: None,
            operation_detail: OperationDetail::None,
            possible_duplicate: AtomicBool::new(possible_duplicate),
            creation_time_ms: WallClock::now().as_millis(),
            version_timestamp,
            bucket_id: NO_BUCKET,
            shadow_key: NO_SHADOW_KEY,
            acked: AtomicBool::new(false),
            dispatched: AtomicBool::new(false),
        })
    }

    /// Builds and initializes in one step.
    pub fn new_initialized(
        operation: ListenerOperation,
        record: Arc<dyn MutationRecord>,
        substitute_value: Option<SubstituteValue>,
        serializer: &dyn ValueSerializer,
    ) -> Result<Self, GatewayEventError> {
        let mut event = Self::new(operation, record, substitute_value)?;
        event.initialize(serializer)?;
        Ok(event)
    }

    pub fn with_bucket_id(mut self, bucket_id: i32) -> Self {
        self.bucket_id = bucket_id;
        self
    }

    pub(crate) fn from_wire(fields: WireFields) -> Self {
        Self {
            identity: fields.identity,
            classification: Classification::ByAction(fields.action),
            substitute_value: None,
            region_path: fields.region_path,
            key: KeyState::Resolved(fields.key),
            value: fields.value,
            value_is_object: fields.value_is_object,
            callback_argument: fields.callback_argument,
            operation_detail: OperationDetail::None,
            possible_duplicate: AtomicBool::new(fields.possible_duplicate),
            creation_time_ms: fields.creation_time_ms,
            version_timestamp: fields.version_timestamp,
            bucket_id: fields.bucket_id,
            shadow_key: fields.shadow_key,
            acked: AtomicBool::new(false),
            dispatched: AtomicBool::new(false),
        }
    }

    /// Resolves key, value, callback argument, operation detail and shadow
    /// key from the source record, then releases the record.
    ///
    /// No-op once initialized. On error nothing is changed and the call may
    /// be retried.
    pub fn initialize(&mut self, serializer: &dyn ValueSerializer) -> Result<(), GatewayEventError> {
        let record = match &self.key {
            KeyState::Resolved(_) => return Ok(()),
            KeyState::Pending(record) => Arc::clone(record),
        };

        let (value, value_is_object) = self.resolve_value(record.as_ref(), serializer)?;
        let key = record.key();
        let callback_argument = record.raw_callback_argument();
        let operation_detail = OperationDetail::from_flags(record.operation_flags());
        let shadow_key = record.assigned_sequence_number();

        self.value = value;
        self.value_is_object = value_is_object;
        self.callback_argument = callback_argument;
        self.operation_detail = operation_detail;
        self.shadow_key = shadow_key;
        self.key = KeyState::Resolved(key);

        tracing::trace!(
            identity = %self.identity,
            region = %self.region_path,
            action = %self.action(),
            parts = self.number_of_parts(),
            "gateway event initialized"
        );
        Ok(())
    }

    fn resolve_value(
        &self,
        record: &dyn MutationRecord,
        serializer: &dyn ValueSerializer,
    ) -> Result<(Option<Bytes>, bool), GatewayEventError> {
        let cx = SerdeContext::serializing(&self.region_path);
        match &self.substitute_value {
            Some(SubstituteValue::Bytes(bytes)) => return Ok((Some(bytes.clone()), false)),
            Some(SubstituteValue::Null) => return Ok((None, true)),
            Some(SubstituteValue::Object(value)) => {
                let bytes = serializer
                    .serialize(value, &cx)
                    .map_err(|source| self.encoding_error(source))?;
                return Ok((Some(bytes), true));
            }
            None => {}
        }

        if let Some(bytes) = record.serialized_new_value() {
            return Ok((Some(bytes), true));
        }
        if let Some(bytes) = record.cached_serialized_new_value() {
            return Ok((Some(bytes), true));
        }
        match record.raw_new_value() {
            None => Ok((None, true)),
            Some(Value::Bytes(bytes)) => Ok((Some(bytes), false)),
            Some(value) => {
                let bytes = serializer
                    .serialize(&value, &cx)
                    .map_err(|source| self.encoding_error(source))?;
                record.cache_serialized_new_value(bytes.clone());
                Ok((Some(bytes), true))
            }
        }
    }

    fn encoding_error(&self, source: SerializeError) -> GatewayEventError {
        GatewayEventError::Encoding {
            region_path: self.region_path.clone(),
            source,
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.key, KeyState::Resolved(_))
    }

    pub fn identity(&self) -> &EventIdentity {
        &self.identity
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// Listener callback the event was built from; `None` once rehydrated.
    pub fn listener_operation(&self) -> Option<ListenerOperation> {
        match self.classification {
            Classification::ByOperationKind(kind) => Some(kind),
            Classification::ByAction(_) => None,
        }
    }

    pub fn action(&self) -> Action {
        self.classification.action()
    }

    pub fn operation_detail(&self) -> OperationDetail {
        self.operation_detail
    }

    pub fn operation(&self) -> Operation {
        Operation::resolve(self.action(), self.operation_detail)
    }

    /// Derived from the action and whether a callback argument is present.
    /// Before initialize the callback is looked up on the pending record.
    pub fn number_of_parts(&self) -> i32 {
        let has_callback = match &self.key {
            KeyState::Resolved(_) => self.callback_argument.is_some(),
            KeyState::Pending(record) => record.raw_callback_argument().is_some(),
        };
        self.action().number_of_parts(has_callback)
    }

    pub fn region_path(&self) -> &str {
        &self.region_path
    }

    /// The key; `None` for a null key or an event not yet initialized.
    pub fn key(&self) -> Option<&Value> {
        match &self.key {
            KeyState::Resolved(key) => key.as_ref(),
            KeyState::Pending(_) => None,
        }
    }

    pub fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    pub fn value_is_object(&self) -> bool {
        self.value_is_object
    }

    /// Decodes the value bytes. Raw (non-object) bytes come back as
    /// [`Value::Bytes`].
    pub fn deserialized_value(
        &self,
        serializer: &dyn ValueSerializer,
    ) -> Result<Option<Value>, SerializeError> {
        let Some(bytes) = self.value.as_ref() else {
            return Ok(None);
        };
        if !self.value_is_object {
            return Ok(Some(Value::Bytes(bytes.clone())));
        }
        let cx = SerdeContext::deserializing(&self.region_path);
        serializer.deserialize(bytes, &cx).map(Some)
    }

    pub fn substitute_value(&self) -> Option<&SubstituteValue> {
        self.substitute_value.as_ref()
    }

    /// Innermost callback payload, with every wrapper layer removed.
    pub fn callback_argument(&self) -> Option<&Value> {
        self.callback_argument
            .as_ref()
            .and_then(CallbackArgument::unwrapped)
    }

    /// Callback argument as attached by the sender, wrappers included.
    pub fn sender_callback_argument(&self) -> Option<&CallbackArgument> {
        self.callback_argument.as_ref()
    }

    pub fn possible_duplicate(&self) -> bool {
        self.possible_duplicate.load(Ordering::SeqCst)
    }

    pub fn set_possible_duplicate(&self, possible_duplicate: bool) {
        self.possible_duplicate
            .store(possible_duplicate, Ordering::SeqCst);
    }

    pub fn creation_time_ms(&self) -> u64 {
        self.creation_time_ms
    }

    pub fn version_timestamp(&self) -> u64 {
        self.version_timestamp
    }

    pub fn bucket_id(&self) -> i32 {
        self.bucket_id
    }

    pub fn shadow_key(&self) -> i64 {
        self.shadow_key
    }

    pub fn is_acked(&self) -> bool {
        self.acked.load(Ordering::SeqCst)
    }

    /// Returns `true` if this call moved the flag from unset to set.
    pub fn mark_acked(&self) -> bool {
        !self.acked.swap(true, Ordering::SeqCst)
    }

    pub fn is_dispatched(&self) -> bool {
        self.dispatched.load(Ordering::SeqCst)
    }

    /// Returns `true` if this call moved the flag from unset to set.
    pub fn mark_dispatched(&self) -> bool {
        !self.dispatched.swap(true, Ordering::SeqCst)
    }

    pub fn is_create(&self) -> bool {
        match self.classification {
            Classification::ByOperationKind(kind) => kind == ListenerOperation::AfterCreate,
            Classification::ByAction(action) => action == Action::Create,
        }
    }

    pub fn is_update(&self) -> bool {
        match self.classification {
            Classification::ByOperationKind(kind) => kind == ListenerOperation::AfterUpdate,
            Classification::ByAction(action) => action == Action::Update,
        }
    }

    pub fn is_destroy(&self) -> bool {
        match self.classification {
            Classification::ByOperationKind(kind) => kind == ListenerOperation::AfterDestroy,
            Classification::ByAction(action) => action == Action::Destroy,
        }
    }

    pub(crate) fn replace_value(&mut self, value: Option<Bytes>, value_is_object: bool) {
        self.value = value;
        self.value_is_object = value_is_object;
    }
}

impl fmt::Display for GatewayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GatewayEvent[id={} action={} operation={:?} region={} key=",
            self.identity,
            self.action(),
            self.operation(),
            self.region_path
        )?;
        match &self.key {
            KeyState::Pending(_) => f.write_str("<uninitialized>")?,
            KeyState::Resolved(Some(key)) => write!(f, "{key}")?,
            KeyState::Resolved(None) => f.write_str("null")?,
        }
        match &self.value {
            Some(bytes) => write!(f, " value_len={}", bytes.len())?,
            None => f.write_str(" value=null")?,
        }
        write!(
            f,
            " value_is_object={} parts={} callback=",
            self.value_is_object,
            self.number_of_parts()
        )?;
        match &self.callback_argument {
            Some(arg) => write!(f, "{arg}")?,
            None => f.write_str("null")?,
        }
        write!(
            f,
            " possible_duplicate={} created={} bucket={} shadow_key={} version_ts={} acked={} dispatched={}]",
            self.possible_duplicate(),
            self.creation_time_ms,
            self.bucket_id,
            self.shadow_key,
            self.version_timestamp,
            self.is_acked(),
            self.is_dispatched()
        )
    }
}
