//! Boundary to the cache that produces mutation records.

use std::fmt;

use bytes::Bytes;

use super::identity::EventIdentity;
use super::operation::OperationFlags;
use super::value::{CallbackArgument, Value};

/// Version stamp of the entry a mutation was applied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionTag {
    pub version_timestamp: u64,
}

/// A cache mutation as exposed to the gateway sender.
///
/// Implementations are owned by the cache; the gateway event only borrows a
/// handle until it has captured everything it needs. The record may be
/// serialized away by its owner in the meantime, which is why region path,
/// duplicate flag and version stamp are captured eagerly at event
/// construction.
pub trait MutationRecord: Send + Sync + fmt::Debug {
    fn event_identity(&self) -> Option<EventIdentity>;

    fn region_path(&self) -> String;

    fn is_possible_duplicate(&self) -> bool;

    fn key(&self) -> Option<Value>;

    /// Serialized form of the new value, when the cache already holds one.
    fn serialized_new_value(&self) -> Option<Bytes>;

    /// Serialized form cached by an earlier consumer of this record.
    fn cached_serialized_new_value(&self) -> Option<Bytes>;

    fn raw_new_value(&self) -> Option<Value>;

    fn raw_callback_argument(&self) -> Option<CallbackArgument>;

    fn operation_flags(&self) -> OperationFlags;

    fn version_tag(&self) -> Option<VersionTag>;

    /// Per-bucket sequence number assigned at the source, `-1` when none.
    fn assigned_sequence_number(&self) -> i64;

    fn cache_serialized_new_value(&self, bytes: Bytes);
}
