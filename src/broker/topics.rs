//! Topic filters and subscription bookkeeping.
//!
//! [`TopicFilterSet`] is the validated, de-duplicated set of filters the
//! gateway wants. [`SubscriptionTracker`] remembers what was last
//! subscribed on the live session and plans the minimal subscribe /
//! unsubscribe calls to reach a new set.

use std::collections::BTreeSet;

use crate::error::BrokerError;

/// Control events of devices placed directly in a room.
pub const ROOM_DEVICE_FILTER: &str = "rooms/+/objects/+/resources/+/control";

/// Control events of devices mounted in a rack.
pub const RACK_DEVICE_FILTER: &str = "rooms/+/racks/+/objects/+/resources/+/control";

/// Validated set of MQTT topic filters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopicFilterSet {
    filters: BTreeSet<String>,
}

impl TopicFilterSet {
    /// Builds a set from raw filters. Blank entries are skipped and
    /// duplicates collapse.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::InvalidFilter`] for a filter that misuses the
    /// `+` or `#` wildcards.
    pub fn new<I, S>(filters: I) -> Result<Self, BrokerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for raw in filters {
            let filter = raw.as_ref().trim();
            if filter.is_empty() {
                continue;
            }
            validate_filter(filter)?;
            set.insert(filter.to_string());
        }
        Ok(Self { filters: set })
    }

    /// The two default control-event filters (room-level and rack-level
    /// devices).
    #[must_use]
    pub fn control_events() -> Self {
        Self {
            filters: [ROOM_DEVICE_FILTER, RACK_DEVICE_FILTER]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Iterates over the filters in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(String::as_str)
    }

    /// Returns `true` if the filter is in the set.
    #[must_use]
    pub fn contains(&self, filter: &str) -> bool {
        self.filters.contains(filter)
    }

    /// Returns the number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if the set has no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Checks MQTT filter syntax: `#` only as the whole last level, `+` only
/// as a whole level.
///
/// # Errors
///
/// Returns [`BrokerError::InvalidFilter`] describing the first violation.
pub fn validate_filter(filter: &str) -> Result<(), BrokerError> {
    let invalid = |reason| BrokerError::InvalidFilter {
        filter: filter.to_string(),
        reason,
    };
    let levels: Vec<&str> = filter.split('/').collect();
    let last = levels.len().saturating_sub(1);
    for (i, level) in levels.iter().enumerate() {
        if level.contains('#') && (*level != "#" || i != last) {
            return Err(invalid("'#' must be the entire last level"));
        }
        if level.contains('+') && *level != "+" {
            return Err(invalid("'+' must occupy an entire level"));
        }
    }
    Ok(())
}

/// Calls needed to move the live session to a new filter set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionPlan {
    /// Filters wanted but not yet subscribed.
    pub subscribe: Vec<String>,
    /// Filters subscribed but no longer wanted.
    pub unsubscribe: Vec<String>,
}

impl SubscriptionPlan {
    /// Returns `true` when the session already matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribe.is_empty() && self.unsubscribe.is_empty()
    }
}

/// Filters currently subscribed on the live broker session.
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    active: BTreeSet<String>,
}

impl SubscriptionTracker {
    /// Creates a tracker with nothing subscribed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the set difference between `desired` and what is active.
    #[must_use]
    pub fn plan(&self, desired: &TopicFilterSet) -> SubscriptionPlan {
        SubscriptionPlan {
            subscribe: desired
                .filters
                .difference(&self.active)
                .cloned()
                .collect(),
            unsubscribe: self
                .active
                .difference(&desired.filters)
                .cloned()
                .collect(),
        }
    }

    /// Records a successful subscribe.
    pub fn mark_subscribed(&mut self, filter: &str) {
        self.active.insert(filter.to_string());
    }

    /// Records a successful unsubscribe.
    pub fn mark_unsubscribed(&mut self, filter: &str) {
        self.active.remove(filter);
    }

    /// Forgets everything. Called when the session is lost, since a new
    /// clean session starts with no subscriptions.
    pub fn reset(&mut self) {
        self.active.clear();
    }

    /// Returns the number of active filters.
    #[must_use]
    pub fn count(&self) -> usize {
        self.active.len()
    }

    /// Returns `true` if the filter is active.
    #[must_use]
    pub fn is_active(&self, filter: &str) -> bool {
        self.active.contains(filter)
    }
}
