//! Conflation: collapsing queued updates to one key into the latest value.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;

use crate::config::ConflationConfig;
use crate::core::Value;

use super::event::GatewayEvent;

/// Which events may be replaced by a later event for the same key.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConflationPolicy;

impl ConflationPolicy {
    /// Only updates conflate. Creates, destroys and version-stamp updates
    /// must all reach the remote site.
    pub fn should_conflate(event: &GatewayEvent) -> bool {
        event.is_update()
    }
}

/// Queue entry that can take part in conflation.
pub trait Conflatable {
    fn should_be_conflated(&self) -> bool;

    /// Whether the key and value are known. Entries that are not keyed are
    /// never conflated in either direction.
    fn is_keyed(&self) -> bool;

    fn region_to_conflate(&self) -> &str;

    fn key_to_conflate(&self) -> Option<&Value>;

    fn value_to_conflate(&self) -> Option<&Bytes>;

    /// `false` when the value bytes are raw rather than a serialized object.
    fn value_is_object(&self) -> bool;

    /// Replaces the value and its object flag together.
    fn set_latest_value(&mut self, value: Option<Bytes>, value_is_object: bool);
}

impl Conflatable for GatewayEvent {
    fn should_be_conflated(&self) -> bool {
        ConflationPolicy::should_conflate(self)
    }

    fn is_keyed(&self) -> bool {
        self.is_initialized()
    }

    fn region_to_conflate(&self) -> &str {
        self.region_path()
    }

    fn key_to_conflate(&self) -> Option<&Value> {
        self.key()
    }

    fn value_to_conflate(&self) -> Option<&Bytes> {
        self.value()
    }

    fn value_is_object(&self) -> bool {
        GatewayEvent::value_is_object(self)
    }

    fn set_latest_value(&mut self, value: Option<Bytes>, value_is_object: bool) {
        self.replace_value(value, value_is_object);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConflationKey {
    pub region: String,
    pub key: Option<Value>,
}

impl ConflationKey {
    /// `None` for an entry whose key is not known yet.
    pub fn of<E: Conflatable>(entry: &E) -> Option<Self> {
        entry.is_keyed().then(|| Self {
            region: entry.region_to_conflate().to_string(),
            key: entry.key_to_conflate().cloned(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Added at the tail.
    Appended { position: u64 },
    /// Folded into the entry already queued at `position`.
    Conflated { position: u64 },
}

/// Arrival-ordered queue that conflates updates per `(region, key)`.
///
/// Conflation overwrites the queued entry's value and leaves its position
/// alone. Any non-conflatable entry for a key ends that key's conflation
/// run, so an update never jumps over a create or destroy queued after it.
/// An entry that is not keyed yet could belong to any key of its region,
/// so it ends the run of every key in that region.
#[derive(Debug)]
pub struct ConflatingQueue<E> {
    config: ConflationConfig,
    entries: BTreeMap<u64, E>,
    latest: HashMap<ConflationKey, u64>,
    next_position: u64,
    conflated: u64,
}

impl<E: Conflatable> ConflatingQueue<E> {
    pub fn new(config: ConflationConfig) -> Self {
        Self {
            config,
            entries: BTreeMap::new(),
            latest: HashMap::new(),
            next_position: 0,
            conflated: 0,
        }
    }

    pub fn enqueue(&mut self, entry: E) -> EnqueueOutcome {
        let Some(key) = ConflationKey::of(&entry) else {
            let region = entry.region_to_conflate();
            self.latest.retain(|key, _| key.region != region);
            tracing::trace!(region, "queued entry without a resolved key");
            return EnqueueOutcome::Appended {
                position: self.push(entry),
            };
        };
        if self.config.enabled && entry.should_be_conflated() {
            if let Some(&position) = self.latest.get(&key)
                && let Some(queued) = self.entries.get_mut(&position)
            {
                queued.set_latest_value(
                    entry.value_to_conflate().cloned(),
                    entry.value_is_object(),
                );
                self.conflated += 1;
                tracing::debug!(
                    region = %key.region,
                    position,
                    "conflated update into queued entry"
                );
                return EnqueueOutcome::Conflated { position };
            }
            let position = self.push(entry);
            self.latest.insert(key, position);
            return EnqueueOutcome::Appended { position };
        }

        self.latest.remove(&key);
        EnqueueOutcome::Appended {
            position: self.push(entry),
        }
    }

    fn push(&mut self, entry: E) -> u64 {
        let position = self.next_position;
        self.next_position += 1;
        self.entries.insert(position, entry);
        position
    }

    /// Removes the oldest entry.
    pub fn pop(&mut self) -> Option<E> {
        let (position, entry) = self.entries.pop_first()?;
        if let Some(key) = ConflationKey::of(&entry)
            && self.latest.get(&key) == Some(&position)
        {
            self.latest.remove(&key);
        }
        Some(entry)
    }

    pub fn peek(&self) -> Option<&E> {
        self.entries.values().next()
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Updates folded into an existing entry since the queue was created.
    pub fn conflated_count(&self) -> u64 {
        self.conflated
    }
}
