//! Live connection status per profile
//!
//! Kept apart from the persisted copy in the profile store so transient
//! states are always current in memory.

use std::collections::HashMap;

use crate::profile::ConnectionStatus;

/// In-memory map from profile id to current status
#[derive(Debug, Default, Clone)]
pub struct StatusTracker {
    statuses: HashMap<String, ConnectionStatus>,
}

impl StatusTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status, `Disconnected` for unknown ids
    #[must_use]
    pub fn get(&self, id: &str) -> ConnectionStatus {
        self.statuses.get(id).copied().unwrap_or_default()
    }

    /// Record a new status, returning the previous one
    pub fn set(&mut self, id: &str, status: ConnectionStatus) -> ConnectionStatus {
        self.statuses
            .insert(id.to_string(), status)
            .unwrap_or_default()
    }

    /// Track every given id, defaulting to disconnected. Existing entries are kept.
    pub fn initialize<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            self.statuses.entry(id.to_string()).or_default();
        }
    }

    /// Stop tracking a profile
    pub fn remove(&mut self, id: &str) -> Option<ConnectionStatus> {
        self.statuses.remove(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.statuses.contains_key(id)
    }

    /// Copy of the whole map
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, ConnectionStatus> {
        self.statuses.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_defaults_to_disconnected() {
        let tracker = StatusTracker::new();
        assert_eq!(tracker.get("nope"), ConnectionStatus::Disconnected);
        assert!(!tracker.contains("nope"));
    }

    #[test]
    fn test_initialize_keeps_existing_status() {
        let mut tracker = StatusTracker::new();
        tracker.set("a", ConnectionStatus::Connected);
        tracker.initialize(["a", "b"]);

        assert_eq!(tracker.get("a"), ConnectionStatus::Connected);
        assert_eq!(tracker.get("b"), ConnectionStatus::Disconnected);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_set_returns_previous() {
        let mut tracker = StatusTracker::new();
        assert_eq!(
            tracker.set("a", ConnectionStatus::Connecting),
            ConnectionStatus::Disconnected
        );
        assert_eq!(
            tracker.set("a", ConnectionStatus::Error),
            ConnectionStatus::Connecting
        );
        assert_eq!(tracker.remove("a"), Some(ConnectionStatus::Error));
        assert!(tracker.is_empty());
    }
}
