//! Per-index failures reported when a remote site rejects a batch.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

pub type FailureCause = Arc<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BatchFailureError {
    #[error("cannot aggregate an empty list of batch failures")]
    Empty,
}

/// Failure of one event in a batch, or an aggregate of several.
///
/// An aggregate reports the first failure's index, batch id and message and
/// keeps every input failure, in order, so the dispatcher can retry exactly
/// the rejected indices.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BatchFailure {
    index: i32,
    batch_id: i32,
    message: String,
    #[source]
    cause: Option<FailureCause>,
    sub_failures: Vec<BatchFailure>,
}

impl BatchFailure {
    pub fn aggregate(failures: Vec<BatchFailure>) -> Result<Self, BatchFailureError> {
        let first = failures.first().ok_or(BatchFailureError::Empty)?;
        Ok(Self {
            index: first.index,
            batch_id: first.batch_id,
            message: first.message.clone(),
            cause: None,
            sub_failures: failures,
        })
    }

    /// Failure at index 0 of `batch_id`.
    pub fn from_message(message: impl Into<String>, batch_id: i32) -> Self {
        Self::at_index(message, 0, batch_id)
    }

    pub fn at_index(message: impl Into<String>, index: i32, batch_id: i32) -> Self {
        Self {
            index,
            batch_id,
            message: message.into(),
            cause: None,
            sub_failures: Vec::new(),
        }
    }

    /// Failure caused by `cause`, batch id 0; the message is the cause's.
    pub fn from_cause<E>(cause: E, index: i32) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::from_cause_in_batch(cause, index, 0)
    }

    pub fn from_cause_in_batch<E>(cause: E, index: i32, batch_id: i32) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let message = cause.to_string();
        Self {
            index,
            batch_id,
            message,
            cause: Some(Arc::new(cause)),
            sub_failures: Vec::new(),
        }
    }

    pub fn with_message_and_cause<E>(
        message: impl Into<String>,
        cause: E,
        index: i32,
        batch_id: i32,
    ) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            index,
            batch_id,
            message: message.into(),
            cause: Some(Arc::new(cause)),
            sub_failures: Vec::new(),
        }
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn batch_id(&self) -> i32 {
        self.batch_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&FailureCause> {
        self.cause.as_ref()
    }

    /// Empty unless built by [`BatchFailure::aggregate`].
    pub fn sub_failures(&self) -> &[BatchFailure] {
        &self.sub_failures
    }

    pub fn is_aggregate(&self) -> bool {
        !self.sub_failures.is_empty()
    }

    /// Indices to retry, one per reported failure, in report order.
    pub fn failed_indices(&self) -> Vec<i32> {
        if self.sub_failures.is_empty() {
            return vec![self.index];
        }
        self.sub_failures.iter().map(BatchFailure::index).collect()
    }
}

/// Causes compare by rendered message; `dyn Error` has no equality.
impl PartialEq for BatchFailure {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.batch_id == other.batch_id
            && self.message == other.message
            && self.cause.as_ref().map(ToString::to_string)
                == other.cause.as_ref().map(ToString::to_string)
            && self.sub_failures == other.sub_failures
    }
}

impl Eq for BatchFailure {}
