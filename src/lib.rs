#![forbid(unsafe_code)]

pub mod config;
pub mod core;
pub mod error;
pub mod telemetry;
pub mod wan;

pub use error::{Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export the working set at crate root for convenience
pub use crate::core::{
    Action, CallbackArgument, CborValueSerializer, EventIdentity, ListenerOperation,
    MembershipId, MutationRecord, Operation, OperationDetail, OperationFlags, SerdeContext,
    SubstituteValue, Value, ValueSerializer, VersionTag,
};
pub use crate::wan::{
    BatchFailure, ConflatingQueue, ConflationPolicy, GatewayEvent, SizeEstimator, decode_event,
    encode_event,
};
