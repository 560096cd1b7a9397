//! Profile types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connection status of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No tunnel is up
    #[default]
    Disconnected,
    /// A helper is running for this profile, in either direction
    Connecting,
    /// Tunnel is up
    Connected,
    /// Accepted in persisted files; never set by the supervisor
    Disconnecting,
    /// Last operation failed
    Error,
}

impl ConnectionStatus {
    /// Whether a helper operation is conceptually running
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Connecting | Self::Disconnecting)
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Disconnecting => write!(f, "disconnecting"),
            ConnectionStatus::Error => write!(f, "error"),
        }
    }
}

/// Direction of a tunnel transition, passed to the helper as its first argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Token passed on the helper command line
    #[must_use]
    pub fn as_arg(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    /// Status reached when the helper succeeds
    #[must_use]
    pub fn target_status(self) -> ConnectionStatus {
        match self {
            Direction::Up => ConnectionStatus::Connected,
            Direction::Down => ConnectionStatus::Disconnected,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// A named WireGuard configuration reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Unique identifier, immutable once created
    pub id: String,
    /// Display name
    pub name: String,
    /// Configuration file consumed by the helper
    pub config_path: String,
}

impl Profile {
    /// Create a new profile with a freshly generated id
    #[must_use]
    pub fn new(name: String, config_path: String) -> Self {
        Self {
            id: new_profile_id(),
            name,
            config_path,
        }
    }
}

/// Generate a profile id from the current time and random bits
#[must_use]
pub fn new_profile_id() -> String {
    Uuid::now_v7().to_string()
}

/// A profile merged with its live status, as returned by listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: String,
    pub name: String,
    pub config_path: String,
    pub status: ConnectionStatus,
}

impl ProfileView {
    pub(crate) fn new(profile: &Profile, status: ConnectionStatus) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            config_path: profile.config_path.clone(),
            status,
        }
    }
}

/// Outcome of a connect or disconnect request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionResult {
    pub ok: bool,
    pub status: ConnectionStatus,
    pub message: String,
}

impl TransitionResult {
    #[must_use]
    pub fn success(status: ConnectionStatus, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failure(status: ConnectionStatus, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ConnectionStatus::Connecting).unwrap();
        assert_eq!(json, "\"connecting\"");
        let parsed: ConnectionStatus = serde_json::from_str("\"disconnecting\"").unwrap();
        assert_eq!(parsed, ConnectionStatus::Disconnecting);
    }

    #[test]
    fn test_transient_statuses() {
        assert!(ConnectionStatus::Connecting.is_transient());
        assert!(ConnectionStatus::Disconnecting.is_transient());
        assert!(!ConnectionStatus::Connected.is_transient());
        assert!(!ConnectionStatus::Error.is_transient());
    }

    #[test]
    fn test_profile_ids_are_unique() {
        let a = Profile::new("a".to_string(), "/a.conf".to_string());
        let b = Profile::new("b".to_string(), "/b.conf".to_string());
        assert_ne!(a.id, b.id);
        assert!(!a.id.is_empty());
    }

    #[test]
    fn test_view_uses_camel_case() {
        let profile = Profile::new("Home".to_string(), "/etc/wg/home.conf".to_string());
        let view = ProfileView::new(&profile, ConnectionStatus::Connected);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["configPath"], "/etc/wg/home.conf");
        assert_eq!(json["status"], "connected");
    }

    #[test]
    fn test_direction_target_status() {
        assert_eq!(Direction::Up.target_status(), ConnectionStatus::Connected);
        assert_eq!(Direction::Down.target_status(), ConnectionStatus::Disconnected);
        assert_eq!(Direction::Down.as_arg(), "down");
    }
}
