//! Event identity atoms
//!
//! MembershipId: opaque id of the member that produced a mutation
//! EventIdentity: (membership, thread, sequence) triple used for receiver dedup

use std::cmp::Ordering;
use std::fmt;

use bytes::Bytes;
use uuid::Uuid;

use super::error::{CoreError, InvalidId};

/// Opaque membership identifier of the producing member.
///
/// The bytes are never interpreted; receivers only compare them.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MembershipId(Bytes);

impl MembershipId {
    pub fn new(raw: impl Into<Bytes>) -> Result<Self, CoreError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidId::Membership {
                reason: "empty".into(),
            }
            .into());
        }
        Ok(Self(raw))
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(Bytes::copy_from_slice(id.as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for MembershipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MembershipId({self})")
    }
}

impl fmt::Display for MembershipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Identity of the mutation a gateway event replicates.
///
/// Fixed at construction. Ordering is per producer: thread id first, then
/// sequence id, with the membership id only as a tiebreak so `Ord` agrees
/// with `Eq`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventIdentity {
    membership: MembershipId,
    thread_id: i64,
    sequence_id: i64,
}

impl EventIdentity {
    pub fn new(membership: MembershipId, thread_id: i64, sequence_id: i64) -> Self {
        Self {
            membership,
            thread_id,
            sequence_id,
        }
    }

    pub fn membership(&self) -> &MembershipId {
        &self.membership
    }

    pub fn thread_id(&self) -> i64 {
        self.thread_id
    }

    pub fn sequence_id(&self) -> i64 {
        self.sequence_id
    }
}

impl PartialOrd for EventIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.thread_id
            .cmp(&other.thread_id)
            .then_with(|| self.sequence_id.cmp(&other.sequence_id))
            .then_with(|| self.membership.cmp(&other.membership))
    }
}

impl fmt::Display for EventIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EventIdentity[membership={};thread={};sequence={}]",
            self.membership, self.thread_id, self.sequence_id
        )
    }
}
