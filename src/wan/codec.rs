//! Versioned binary record for gateway events.
//!
//! Layout (big-endian), current version `0x11`:
//!
//! ```text
//! version: u16, action: i32, number_of_parts: i32, identity,
//! region_path: string, value_is_object: u8, key, value: bytes?,
//! callback_argument, possible_duplicate: u8, creation_time_ms: i64,
//! bucket_id: i32, shadow_key: i64, version_timestamp: i64
//! ```
//!
//! Strings and byte arrays carry an `i32` length, `-1` for null. Identity,
//! key and callback argument are preceded by a presence byte; key and
//! callback argument payloads are CBOR byte arrays.
//!
//! Identity is `membership: bytes, thread_id: i64, sequence_id: i64` plus a
//! reserved `u8` on the current protocol. Records written before `0x11` lack
//! the reserved byte.

use bytes::{BufMut, Bytes};
use thiserror::Error;

use crate::core::serializer::{
    decode_callback_argument, decode_value, encode_callback_argument, encode_value,
};
use crate::core::{
    Action, CallbackArgument, EventIdentity, MembershipId, SerializeError, Value, ValueSerializer,
};

use super::event::{GatewayEvent, GatewayEventError, WireFields};

pub const EVENT_RECORD_VERSION: u16 = 0x11;
pub const LEGACY_EVENT_RECORD_VERSION: u16 = 0x10;

const NULL_LEN: i32 = -1;
const ABSENT: u8 = 0;
const PRESENT: u8 = 1;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("event record truncated reading {field}")]
    Truncated { field: &'static str },
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("event record carries no identity")]
    IdentityMissing,
    #[error("{remaining} trailing bytes after event record")]
    TrailingBytes { remaining: usize },
    #[error("event value: {0}")]
    Value(#[from] SerializeError),
    #[error(transparent)]
    Initialize(#[from] GatewayEventError),
    #[error("gateway event must be initialized before encoding")]
    Uninitialized,
}

/// Identity layout spoken by a peer or store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// Writers older than record version `0x11`.
    Legacy,
    Current,
}

impl ProtocolVersion {
    pub fn record_version(self) -> u16 {
        match self {
            ProtocolVersion::Legacy => LEGACY_EVENT_RECORD_VERSION,
            ProtocolVersion::Current => EVENT_RECORD_VERSION,
        }
    }
}

/// Cursor over encoded records.
///
/// An untagged reader speaks the current protocol and lets each record's
/// version pick the identity layout; so does a reader tagged
/// [`ProtocolVersion::Current`]. A reader tagged [`ProtocolVersion::Legacy`]
/// (a stream that negotiated the older protocol with its peer) uses the
/// legacy identity layout for every record.
#[derive(Clone, Debug)]
pub struct WireReader<'a> {
    bytes: &'a [u8],
    offset: usize,
    protocol: Option<ProtocolVersion>,
}

impl<'a> WireReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            protocol: None,
        }
    }

    pub fn tagged(bytes: &'a [u8], protocol: ProtocolVersion) -> Self {
        Self {
            bytes,
            offset: 0,
            protocol: Some(protocol),
        }
    }

    pub fn protocol(&self) -> Option<ProtocolVersion> {
        self.protocol
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], CodecError> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or(CodecError::Truncated { field })?;
        let bytes = self.bytes;
        if end > bytes.len() {
            return Err(CodecError::Truncated { field });
        }
        let slice = &bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], CodecError> {
        let slice = self.take(N, field)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn read_u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        Ok(self.read_array::<1>(field)?[0])
    }

    fn read_bool(&mut self, field: &'static str) -> Result<bool, CodecError> {
        Ok(self.read_u8(field)? != 0)
    }

    fn read_u16(&mut self, field: &'static str) -> Result<u16, CodecError> {
        Ok(u16::from_be_bytes(self.read_array(field)?))
    }

    fn read_i32(&mut self, field: &'static str) -> Result<i32, CodecError> {
        Ok(i32::from_be_bytes(self.read_array(field)?))
    }

    fn read_i64(&mut self, field: &'static str) -> Result<i64, CodecError> {
        Ok(i64::from_be_bytes(self.read_array(field)?))
    }

    fn read_timestamp(&mut self, field: &'static str) -> Result<u64, CodecError> {
        let raw = self.read_i64(field)?;
        u64::try_from(raw).map_err(|_| CodecError::InvalidField {
            field,
            reason: format!("negative timestamp {raw}"),
        })
    }

    fn read_nullable_bytes(&mut self, field: &'static str) -> Result<Option<&'a [u8]>, CodecError> {
        let len = self.read_i32(field)?;
        if len == NULL_LEN {
            return Ok(None);
        }
        let len = usize::try_from(len).map_err(|_| CodecError::InvalidField {
            field,
            reason: format!("negative length {len}"),
        })?;
        self.take(len, field).map(Some)
    }

    fn read_string(&mut self, field: &'static str) -> Result<String, CodecError> {
        let raw = self
            .read_nullable_bytes(field)?
            .ok_or_else(|| CodecError::InvalidField {
                field,
                reason: "null string".to_string(),
            })?;
        std::str::from_utf8(raw)
            .map(str::to_string)
            .map_err(|err| CodecError::InvalidField {
                field,
                reason: err.to_string(),
            })
    }

    /// Presence byte followed by a length-prefixed payload.
    fn read_object(&mut self, field: &'static str) -> Result<Option<&'a [u8]>, CodecError> {
        if self.read_u8(field)? == ABSENT {
            return Ok(None);
        }
        let payload = self
            .read_nullable_bytes(field)?
            .ok_or_else(|| CodecError::InvalidField {
                field,
                reason: "present object with null payload".to_string(),
            })?;
        Ok(Some(payload))
    }

    fn read_identity(&mut self, protocol: ProtocolVersion) -> Result<EventIdentity, CodecError> {
        if self.read_u8("identity")? == ABSENT {
            return Err(CodecError::IdentityMissing);
        }
        let membership = self
            .read_nullable_bytes("identity.membership")?
            .ok_or(CodecError::IdentityMissing)?;
        let membership = MembershipId::new(Bytes::copy_from_slice(membership)).map_err(|err| {
            CodecError::InvalidField {
                field: "identity.membership",
                reason: err.to_string(),
            }
        })?;
        let thread_id = self.read_i64("identity.thread_id")?;
        let sequence_id = self.read_i64("identity.sequence_id")?;
        if protocol == ProtocolVersion::Current {
            let reserved = self.read_u8("identity.reserved")?;
            if reserved != 0 {
                return Err(CodecError::InvalidField {
                    field: "identity.reserved",
                    reason: format!("reserved byte not zero ({reserved})"),
                });
            }
        }
        Ok(EventIdentity::new(membership, thread_id, sequence_id))
    }
}

/// Initializes `event` if needed, then encodes it with the current layout.
pub fn encode_event(
    event: &mut GatewayEvent,
    serializer: &dyn ValueSerializer,
) -> Result<Vec<u8>, CodecError> {
    event.initialize(serializer)?;
    encode_initialized(event)
}

pub fn encode_initialized(event: &GatewayEvent) -> Result<Vec<u8>, CodecError> {
    encode_initialized_as(event, ProtocolVersion::Current)
}

/// Encodes for a reader that speaks `protocol`.
pub fn encode_initialized_as(
    event: &GatewayEvent,
    protocol: ProtocolVersion,
) -> Result<Vec<u8>, CodecError> {
    if !event.is_initialized() {
        return Err(CodecError::Uninitialized);
    }

    let mut buf = Vec::with_capacity(128 + event.value().map_or(0, Bytes::len));
    buf.put_u16(protocol.record_version());
    buf.put_i32(event.action().code());
    buf.put_i32(event.number_of_parts());
    put_identity(&mut buf, event.identity(), protocol)?;
    put_nullable_bytes(&mut buf, "region_path", Some(event.region_path().as_bytes()))?;
    buf.put_u8(u8::from(event.value_is_object()));
    put_key(&mut buf, event.key())?;
    put_nullable_bytes(&mut buf, "value", event.value().map(|bytes| &bytes[..]))?;
    put_callback(&mut buf, event.sender_callback_argument())?;
    buf.put_u8(u8::from(event.possible_duplicate()));
    buf.put_i64(timestamp_to_wire("creation_time_ms", event.creation_time_ms())?);
    buf.put_i32(event.bucket_id());
    buf.put_i64(event.shadow_key());
    buf.put_i64(timestamp_to_wire("version_timestamp", event.version_timestamp())?);
    Ok(buf)
}

/// Decodes exactly one record; trailing bytes are an error.
pub fn decode_event(bytes: &[u8]) -> Result<GatewayEvent, CodecError> {
    let mut reader = WireReader::new(bytes);
    let event = decode_event_from(&mut reader)?;
    if !reader.is_empty() {
        return Err(CodecError::TrailingBytes {
            remaining: reader.remaining(),
        });
    }
    Ok(event)
}

/// Decodes the next record from `reader`, leaving it positioned after it.
pub fn decode_event_from(reader: &mut WireReader<'_>) -> Result<GatewayEvent, CodecError> {
    let version = reader.read_u16("version")?;
    if version != EVENT_RECORD_VERSION && version != LEGACY_EVENT_RECORD_VERSION {
        tracing::warn!(
            version,
            expected = EVENT_RECORD_VERSION,
            "unexpected event record version, decoding with current layout"
        );
    }
    let identity_protocol = match reader.protocol() {
        Some(ProtocolVersion::Legacy) => ProtocolVersion::Legacy,
        Some(ProtocolVersion::Current) | None if version < EVENT_RECORD_VERSION => {
            tracing::debug!(version, "reading pre-0x11 identity layout");
            ProtocolVersion::Legacy
        }
        Some(ProtocolVersion::Current) | None => ProtocolVersion::Current,
    };

    let action_code = reader.read_i32("action")?;
    let action = Action::from_code(action_code).ok_or_else(|| CodecError::InvalidField {
        field: "action",
        reason: format!("unknown action code {action_code}"),
    })?;
    let wire_parts = reader.read_i32("number_of_parts")?;
    let identity = reader.read_identity(identity_protocol)?;
    let region_path = reader.read_string("region_path")?;
    let value_is_object = reader.read_bool("value_is_object")?;
    let key = reader
        .read_object("key")?
        .map(decode_value)
        .transpose()?;
    let value = reader
        .read_nullable_bytes("value")?
        .map(Bytes::copy_from_slice);
    if value.is_none() && !value_is_object {
        return Err(CodecError::InvalidField {
            field: "value",
            reason: "null value flagged as raw bytes".to_string(),
        });
    }
    let callback_argument = reader
        .read_object("callback_argument")?
        .map(decode_callback_argument)
        .transpose()?;
    let possible_duplicate = reader.read_bool("possible_duplicate")?;
    let creation_time_ms = reader.read_timestamp("creation_time_ms")?;
    let bucket_id = reader.read_i32("bucket_id")?;
    let shadow_key = reader.read_i64("shadow_key")?;
    let version_timestamp = reader.read_timestamp("version_timestamp")?;

    let derived_parts = action.number_of_parts(callback_argument.is_some());
    if wire_parts != derived_parts {
        tracing::warn!(
            %identity,
            wire_parts,
            derived_parts,
            "event record part count disagrees with its action"
        );
    }

    Ok(GatewayEvent::from_wire(WireFields {
        identity,
        action,
        region_path,
        value_is_object,
        key,
        value,
        callback_argument,
        possible_duplicate,
        creation_time_ms,
        bucket_id,
        shadow_key,
        version_timestamp,
    }))
}

fn put_identity(
    buf: &mut Vec<u8>,
    identity: &EventIdentity,
    protocol: ProtocolVersion,
) -> Result<(), CodecError> {
    buf.put_u8(PRESENT);
    put_nullable_bytes(buf, "identity.membership", Some(identity.membership().as_bytes()))?;
    buf.put_i64(identity.thread_id());
    buf.put_i64(identity.sequence_id());
    if protocol == ProtocolVersion::Current {
        buf.put_u8(0);
    }
    Ok(())
}

fn put_key(buf: &mut Vec<u8>, key: Option<&Value>) -> Result<(), CodecError> {
    match key {
        None => buf.put_u8(ABSENT),
        Some(key) => {
            let payload = encode_value(key)?;
            buf.put_u8(PRESENT);
            put_nullable_bytes(buf, "key", Some(payload.as_slice()))?;
        }
    }
    Ok(())
}

fn put_callback(buf: &mut Vec<u8>, arg: Option<&CallbackArgument>) -> Result<(), CodecError> {
    match arg {
        None => buf.put_u8(ABSENT),
        Some(arg) => {
            let payload = encode_callback_argument(arg)?;
            buf.put_u8(PRESENT);
            put_nullable_bytes(buf, "callback_argument", Some(payload.as_slice()))?;
        }
    }
    Ok(())
}

fn put_nullable_bytes(
    buf: &mut Vec<u8>,
    field: &'static str,
    bytes: Option<&[u8]>,
) -> Result<(), CodecError> {
    match bytes {
        None => buf.put_i32(NULL_LEN),
        Some(bytes) => {
            let len = i32::try_from(bytes.len()).map_err(|_| CodecError::InvalidField {
                field,
                reason: format!("length {} exceeds i32", bytes.len()),
            })?;
            buf.put_i32(len);
            buf.put_slice(bytes);
        }
    }
    Ok(())
}

fn timestamp_to_wire(field: &'static str, value: u64) -> Result<i64, CodecError> {
    i64::try_from(value).map_err(|_| CodecError::InvalidField {
        field,
        reason: format!("timestamp {value} exceeds i64"),
    })
}
