use thiserror::Error;

use crate::config::ConfigError;
use crate::core::{CoreError, SerializeError};
use crate::wan::{BatchFailureError, CodecError, GatewayEventError, SpillFrameError};

/// Whether retrying this operation may succeed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transience {
    /// Retry will never help without changing inputs/state.
    Permanent,
    /// Retry may help (transient contention/outage).
    Retryable,
}

impl Transience {
    pub fn is_retryable(self) -> bool {
        matches!(self, Transience::Retryable)
    }
}

/// What we know about side effects when an error is returned.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Effect {
    /// Nothing was queued, written or mutated.
    None,
    /// A write may have reached the overflow store partially.
    Unknown,
}

/// Crate-level convenience error over the module errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Event(#[from] GatewayEventError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    SpillFrame(#[from] SpillFrameError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Batch(#[from] BatchFailureError),
}

impl Error {
    /// Only I/O against the overflow store or a config file can succeed on
    /// retry; everything else is a property of the input.
    pub fn transience(&self) -> Transience {
        match self {
            Error::SpillFrame(SpillFrameError::Io(_)) | Error::Config(ConfigError::Read { .. }) => {
                Transience::Retryable
            }
            _ => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            Error::SpillFrame(SpillFrameError::Io(_)) => Effect::Unknown,
            _ => Effect::None,
        }
    }
}
