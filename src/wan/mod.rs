//! WAN replication: gateway sender events and what travels with them.
//!
//! - event: the replicated event and its lazy initialization
//! - codec: versioned binary record
//! - frame: overflow spill framing
//! - conflation: which queued updates collapse, and the queue that does it
//! - sizing: in-memory size estimate for overflow decisions
//! - batch: per-index failures from a rejected batch

pub mod batch;
pub mod codec;
pub mod conflation;
pub mod event;
pub mod frame;
pub mod sizing;

pub use batch::{BatchFailure, BatchFailureError, FailureCause};
pub use codec::{
    CodecError, EVENT_RECORD_VERSION, LEGACY_EVENT_RECORD_VERSION, ProtocolVersion, WireReader,
    decode_event, decode_event_from, encode_event, encode_initialized, encode_initialized_as,
};
pub use conflation::{
    Conflatable, ConflatingQueue, ConflationKey, ConflationPolicy, EnqueueOutcome,
};
pub use event::{Classification, GatewayEvent, GatewayEventError, NO_BUCKET, NO_SHADOW_KEY};
pub use frame::{
    DEFAULT_MAX_SPILL_FRAME_BYTES, SPILL_FRAME_HEADER_LEN, SpillFrameError, SpillReader,
    SpillWriter, encode_spill_frame,
};
pub use sizing::SizeEstimator;
