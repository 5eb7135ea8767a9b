//! Bounded, newest-first store of recent [`DeviceEvent`]s.
//!
//! [`AlertAggregator`] is a plain owned value with no interior locking. The
//! service layer wraps it in a single-writer lock; tests drive it directly.

use std::collections::VecDeque;

use chrono::TimeDelta;

use super::DeviceEvent;

/// Default number of retained events.
pub const DEFAULT_CAPACITY: usize = 10;

/// Default near-duplicate window in milliseconds.
pub const DEFAULT_DEDUPE_WINDOW_MS: i64 = 5_000;

/// What [`AlertAggregator::ingest`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The event was prepended. `evicted` records dropped from the tail.
    Inserted {
        /// Number of records evicted to stay within capacity.
        evicted: usize,
    },
    /// The event overwrote the record at `position`, keeping its id.
    Merged {
        /// Index of the merged record (0 = newest).
        position: usize,
    },
}

/// Bounded collection of recent events with near-duplicate merging.
///
/// # Invariants
///
/// - Never holds more than `capacity` records.
/// - Records are newest-first, except that a merge updates in place.
/// - Record ids are unique.
#[derive(Debug, Clone)]
pub struct AlertAggregator {
    events: VecDeque<DeviceEvent>,
    capacity: usize,
    dedupe_window: TimeDelta,
}

impl AlertAggregator {
    /// Creates an empty aggregator with the default capacity and window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_CAPACITY, DEFAULT_DEDUPE_WINDOW_MS)
    }

    /// Creates an empty aggregator with explicit limits. A zero capacity is
    /// raised to one.
    #[must_use]
    pub fn with_limits(capacity: usize, dedupe_window_ms: i64) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            dedupe_window: TimeDelta::milliseconds(dedupe_window_ms.max(0)),
        }
    }

    /// Adds an event, merging it into an existing record when one with the
    /// same object, resource and location lies within the dedupe window.
    pub fn ingest(&mut self, event: DeviceEvent) -> IngestOutcome {
        let window = self.dedupe_window;
        let existing = self.events.iter_mut().enumerate().find(|(_, current)| {
            current.same_source(&event)
                && (current.timestamp - event.timestamp).abs() <= window
        });

        if let Some((position, current)) = existing {
            let id = current.id;
            *current = DeviceEvent { id, ..event };
            return IngestOutcome::Merged { position };
        }

        self.events.push_front(event);
        let evicted = self.events.len().saturating_sub(self.capacity);
        self.events.truncate(self.capacity);
        IngestOutcome::Inserted { evicted }
    }

    /// Returns an owned copy of the current records, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DeviceEvent> {
        self.events.iter().cloned().collect()
    }

    /// Iterates over the current records, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceEvent> {
        self.events.iter()
    }

    /// Returns the number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` before the first ingest.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the maximum number of retained records.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for AlertAggregator {
    fn default() -> Self {
        Self::new()
    }
}
