//! In-memory size estimate of a gateway event, used by the overflow path.
//!
//! The estimate is a calibration model, not a measurement: the constants in
//! [`SizingConfig`] describe the host's object layout and can be re-measured
//! and configured. Whatever the constants, the estimate is a pure function of
//! the event and grows strictly with the value length.

use crate::config::SizingConfig;
use crate::core::Value;

use super::event::GatewayEvent;

/// Object-typed fields charged one reference slot each: identity, region,
/// region path, key, callback argument, operation, source record.
const REFERENCE_FIELDS: usize = 7;

/// action 4, parts 4, value flag 1, duplicate flag 1, bucket 4, shadow key 8,
/// creation time 8, version timestamp 8.
const PRIMITIVE_BYTES: usize = 38;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SizeEstimator {
    config: SizingConfig,
}

impl SizeEstimator {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    pub fn estimate(&self, event: &GatewayEvent) -> usize {
        let c = &self.config;
        let mut size = c.per_object_overhead
            + c.reference_size * REFERENCE_FIELDS
            + PRIMITIVE_BYTES;

        size += c.per_object_overhead + c.identity_footprint;

        if let Some(value) = event.value() {
            size += self.byte_array_size(value.len());
        }

        // The callback wrapper is charged even when no argument is set.
        size += c.per_object_overhead + c.callback_wrapper_footprint;
        size += c.per_object_overhead + self.callback_payload_size(event.callback_argument());
        size
    }

    fn byte_array_size(&self, len: usize) -> usize {
        self.config.per_object_overhead + self.config.array_header + len
    }

    /// Strings get their full deep size, boxed integers a flat estimate,
    /// anything else its deep size less the header already charged.
    fn callback_payload_size(&self, payload: Option<&Value>) -> usize {
        match payload {
            None => 0,
            Some(value @ Value::String(_)) => self.deep_size(value),
            Some(Value::Int(_)) => 4,
            Some(Value::Long(_)) => 8,
            Some(other) => self
                .deep_size(other)
                .saturating_sub(self.config.per_object_overhead),
        }
    }

    /// Deep size of a value including its own object header.
    pub fn deep_size(&self, value: &Value) -> usize {
        let c = &self.config;
        match value {
            Value::Bool(_) => c.per_object_overhead + 1,
            Value::Int(_) => c.per_object_overhead + 4,
            Value::Long(_) => c.per_object_overhead + 8,
            Value::String(s) => {
                c.per_object_overhead + c.reference_size + 4 + self.byte_array_size(s.len())
            }
            Value::Bytes(bytes) => self.byte_array_size(bytes.len()),
            Value::List(items) => {
                let slots = self.byte_array_size(c.reference_size * items.len());
                let listed: usize = items.iter().map(|item| self.deep_size(item)).sum();
                c.per_object_overhead + c.reference_size + 4 + slots + listed
            }
        }
    }
}
