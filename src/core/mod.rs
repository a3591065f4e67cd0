//! Core types for gateway events
//!
//! Module hierarchy follows type dependency order:
//! - time: wall clock stamps
//! - identity: MembershipId, EventIdentity
//! - value: Value, CallbackArgument, SubstituteValue
//! - operation: ListenerOperation, Action, OperationDetail, Operation
//! - serializer: value serialization boundary (CBOR default)
//! - mutation: mutation record boundary

pub mod error;
pub mod identity;
pub mod mutation;
pub mod operation;
pub mod serializer;
pub mod time;
pub mod value;

pub use error::{CoreError, InvalidId};
pub use identity::{EventIdentity, MembershipId};
pub use mutation::{MutationRecord, VersionTag};
pub use operation::{Action, ListenerOperation, Operation, OperationDetail, OperationFlags};
pub use serializer::{
    CborValueSerializer, SerdeContext, SerdePhase, SerializeError, ValueSerializer,
};
pub use time::WallClock;
pub use value::{CallbackArgument, SubstituteValue, Value};
