//! Value serialization boundary and the default CBOR encoding.
//!
//! Values are encoded as two-element arrays `[tag, payload]`; callback
//! arguments as `[0, value]` (plain) or `[1, inner | null]` (wrapped).
//! Nesting is bounded in both directions so a hostile record cannot recurse
//! without limit.

use std::convert::Infallible;

use bytes::Bytes;
use minicbor::data::Type;
use minicbor::{Decoder, Encoder};
use thiserror::Error;

use super::value::{CallbackArgument, Value};

pub const MAX_VALUE_NESTING: usize = 32;

const TAG_BOOL: u8 = 0;
const TAG_INT: u8 = 1;
const TAG_LONG: u8 = 2;
const TAG_STRING: u8 = 3;
const TAG_BYTES: u8 = 4;
const TAG_LIST: u8 = 5;

const TAG_PLAIN: u8 = 0;
const TAG_WRAPPED: u8 = 1;

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("cbor encode: {0}")]
    Encode(#[from] minicbor::encode::Error<Infallible>),
    #[error("cbor decode: {0}")]
    Decode(#[from] minicbor::decode::Error),
    #[error("{what} nesting exceeds {max}")]
    NestingTooDeep { what: &'static str, max: usize },
    #[error("unknown {what} tag {tag}")]
    UnknownTag { what: &'static str, tag: u8 },
    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },
    #[error("indefinite-length CBOR not allowed")]
    IndefiniteLength,
    #[error("trailing bytes after {what}")]
    TrailingBytes { what: &'static str },
    #[error("value rejected by serializer: {reason}")]
    Rejected { reason: String },
}

/// Which direction a value is travelling while the serializer runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerdePhase {
    SerializingValue,
    DeserializingValue,
}

/// Per-call marker handed to the serializer.
///
/// Replaces process-wide "currently serializing" flags: the marker lives for
/// one call on one task and is invisible to every other event.
#[derive(Clone, Copy, Debug)]
pub struct SerdeContext<'a> {
    phase: SerdePhase,
    region_path: &'a str,
}

impl<'a> SerdeContext<'a> {
    pub fn serializing(region_path: &'a str) -> Self {
        Self {
            phase: SerdePhase::SerializingValue,
            region_path,
        }
    }

    pub fn deserializing(region_path: &'a str) -> Self {
        Self {
            phase: SerdePhase::DeserializingValue,
            region_path,
        }
    }

    pub fn phase(&self) -> SerdePhase {
        self.phase
    }

    pub fn is_serializing_value(&self) -> bool {
        self.phase == SerdePhase::SerializingValue
    }

    pub fn is_deserializing_value(&self) -> bool {
        self.phase == SerdePhase::DeserializingValue
    }

    pub fn region_path(&self) -> &'a str {
        self.region_path
    }
}

/// Turns application values into bytes and back.
pub trait ValueSerializer: Send + Sync {
    fn serialize(&self, value: &Value, cx: &SerdeContext<'_>) -> Result<Bytes, SerializeError>;

    fn deserialize(&self, bytes: &[u8], cx: &SerdeContext<'_>) -> Result<Value, SerializeError>;
}

/// Default serializer backed by the CBOR value encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct CborValueSerializer;

impl ValueSerializer for CborValueSerializer {
    fn serialize(&self, value: &Value, _cx: &SerdeContext<'_>) -> Result<Bytes, SerializeError> {
        encode_value(value).map(Bytes::from)
    }

    fn deserialize(&self, bytes: &[u8], _cx: &SerdeContext<'_>) -> Result<Value, SerializeError> {
        decode_value(bytes)
    }
}

pub fn encode_value(value: &Value) -> Result<Vec<u8>, SerializeError> {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    write_value(&mut enc, value, 0)?;
    Ok(buf)
}

pub fn decode_value(bytes: &[u8]) -> Result<Value, SerializeError> {
    let mut dec = Decoder::new(bytes);
    let value = read_value(&mut dec, 0)?;
    if dec.datatype().is_ok() {
        return Err(SerializeError::TrailingBytes { what: "value" });
    }
    Ok(value)
}

pub fn encode_callback_argument(arg: &CallbackArgument) -> Result<Vec<u8>, SerializeError> {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    write_callback(&mut enc, arg, 0)?;
    Ok(buf)
}

pub fn decode_callback_argument(bytes: &[u8]) -> Result<CallbackArgument, SerializeError> {
    let mut dec = Decoder::new(bytes);
    let arg = read_callback(&mut dec, 0)?;
    if dec.datatype().is_ok() {
        return Err(SerializeError::TrailingBytes {
            what: "callback argument",
        });
    }
    Ok(arg)
}

fn write_value(
    enc: &mut Encoder<&mut Vec<u8>>,
    value: &Value,
    depth: usize,
) -> Result<(), SerializeError> {
    if depth > MAX_VALUE_NESTING {
        return Err(SerializeError::NestingTooDeep {
            what: "value",
            max: MAX_VALUE_NESTING,
        });
    }
    enc.array(2)?;
    match value {
        Value::Bool(v) => {
            enc.u8(TAG_BOOL)?.bool(*v)?;
        }
        Value::Int(v) => {
            enc.u8(TAG_INT)?.i32(*v)?;
        }
        Value::Long(v) => {
            enc.u8(TAG_LONG)?.i64(*v)?;
        }
        Value::String(v) => {
            enc.u8(TAG_STRING)?.str(v)?;
        }
        Value::Bytes(v) => {
            enc.u8(TAG_BYTES)?.bytes(v)?;
        }
        Value::List(items) => {
            enc.u8(TAG_LIST)?.array(items.len() as u64)?;
            for item in items {
                write_value(enc, item, depth + 1)?;
            }
        }
    }
    Ok(())
}

fn read_value(dec: &mut Decoder<'_>, depth: usize) -> Result<Value, SerializeError> {
    if depth > MAX_VALUE_NESTING {
        return Err(SerializeError::NestingTooDeep {
            what: "value",
            max: MAX_VALUE_NESTING,
        });
    }
    expect_pair(dec, "value")?;
    let tag = dec.u8()?;
    let value = match tag {
        TAG_BOOL => Value::Bool(dec.bool()?),
        TAG_INT => Value::Int(dec.i32()?),
        TAG_LONG => Value::Long(dec.i64()?),
        TAG_STRING => Value::String(dec.str()?.to_string()),
        TAG_BYTES => Value::Bytes(Bytes::copy_from_slice(dec.bytes()?)),
        TAG_LIST => {
            let len = dec.array()?.ok_or(SerializeError::IndefiniteLength)?;
            let mut items = Vec::new();
            for _ in 0..len {
                items.push(read_value(dec, depth + 1)?);
            }
            Value::List(items)
        }
        other => {
            return Err(SerializeError::UnknownTag {
                what: "value",
                tag: other,
            });
        }
    };
    Ok(value)
}

fn write_callback(
    enc: &mut Encoder<&mut Vec<u8>>,
    arg: &CallbackArgument,
    depth: usize,
) -> Result<(), SerializeError> {
    if depth > MAX_VALUE_NESTING {
        return Err(SerializeError::NestingTooDeep {
            what: "callback argument",
            max: MAX_VALUE_NESTING,
        });
    }
    enc.array(2)?;
    match arg {
        CallbackArgument::Plain(value) => {
            enc.u8(TAG_PLAIN)?;
            write_value(enc, value, 0)?;
        }
        CallbackArgument::Wrapped(Some(inner)) => {
            enc.u8(TAG_WRAPPED)?;
            write_callback(enc, inner, depth + 1)?;
        }
        CallbackArgument::Wrapped(None) => {
            enc.u8(TAG_WRAPPED)?.null()?;
        }
    }
    Ok(())
}

fn read_callback(dec: &mut Decoder<'_>, depth: usize) -> Result<CallbackArgument, SerializeError> {
    if depth > MAX_VALUE_NESTING {
        return Err(SerializeError::NestingTooDeep {
            what: "callback argument",
            max: MAX_VALUE_NESTING,
        });
    }
    expect_pair(dec, "callback argument")?;
    match dec.u8()? {
        TAG_PLAIN => Ok(CallbackArgument::Plain(read_value(dec, 0)?)),
        TAG_WRAPPED => {
            if dec.datatype()? == Type::Null {
                dec.null()?;
                return Ok(CallbackArgument::Wrapped(None));
            }
            let inner = read_callback(dec, depth + 1)?;
            Ok(CallbackArgument::Wrapped(Some(Box::new(inner))))
        }
        other => Err(SerializeError::UnknownTag {
            what: "callback argument",
            tag: other,
        }),
    }
}

fn expect_pair(dec: &mut Decoder<'_>, what: &'static str) -> Result<(), SerializeError> {
    match dec.array()? {
        Some(2) => Ok(()),
        Some(len) => Err(SerializeError::Malformed {
            what,
            reason: format!("expected 2 elements, got {len}"),
        }),
        None => Err(SerializeError::IndefiniteLength),
    }
}
