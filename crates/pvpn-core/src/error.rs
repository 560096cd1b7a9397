//! Error types for the supervision core

use std::path::PathBuf;
use thiserror::Error;

/// Invalid input when adding a profile
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid profile: {0}")]
pub struct ValidationError(pub String);

/// Reasons a connect/disconnect request is refused before the helper runs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// No profile with this id
    #[error("Profile not found: {id}")]
    ProfileNotFound { id: String },

    /// A helper process is already running for this profile
    #[error("An operation is already in progress for this profile")]
    OperationInProgress,

    /// Profile has no configuration file
    #[error("Profile has no configuration file")]
    InvalidConfig,

    /// Profile is already connected or connecting
    #[error("Profile is already connected")]
    AlreadyInState,

    /// Disconnect requested on a profile that is not connected
    #[error("Profile is not connected")]
    NotConnected,
}

impl TransitionError {
    /// Get the error code for CLI/API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProfileNotFound { .. } => "PROFILE_NOT_FOUND",
            Self::OperationInProgress => "OPERATION_IN_PROGRESS",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::AlreadyInState => "ALREADY_IN_STATE",
            Self::NotConnected => "NOT_CONNECTED",
        }
    }
}

/// Failures of a helper invocation
#[derive(Debug, Error)]
pub enum HelperError {
    /// The helper executable does not exist
    #[error("WireGuard helper '{helper}' was not found. Install wireguard-tools and make sure it is on PATH.")]
    NotFound { helper: String },

    /// Any other OS-level spawn failure
    #[error("{0}")]
    Spawn(#[source] std::io::Error),

    /// The helper exited unsuccessfully
    #[error("{message}")]
    Exit { code: Option<i32>, message: String },

    /// The helper did not finish within the connection timeout
    #[error("timeout")]
    Timeout { after_ms: u64 },

    /// The helper was terminated because its profile was removed
    #[error("cancelled")]
    Cancelled,
}

impl HelperError {
    /// Get the error code for CLI/API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "HELPER_NOT_FOUND",
            Self::Spawn(_) => "HELPER_SPAWN_FAILED",
            Self::Exit { .. } => "HELPER_EXIT_FAILED",
            Self::Timeout { .. } => "HELPER_TIMEOUT",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// Persistence errors for the profile file
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize profiles for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors loading the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Errors from `Supervisor::add_profile`
#[derive(Debug, Error)]
pub enum AddProfileError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_messages() {
        let err = TransitionError::ProfileNotFound {
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Profile not found: abc");
        assert_eq!(err.code(), "PROFILE_NOT_FOUND");
        assert_eq!(TransitionError::NotConnected.code(), "NOT_CONNECTED");
    }

    #[test]
    fn test_helper_timeout_message() {
        let err = HelperError::Timeout { after_ms: 25_000 };
        assert_eq!(err.to_string(), "timeout");
        assert_eq!(err.code(), "HELPER_TIMEOUT");
    }

    #[test]
    fn test_helper_not_found_guidance() {
        let err = HelperError::NotFound {
            helper: "wg-quick".to_string(),
        };
        assert!(err.to_string().contains("wg-quick"));
        assert!(err.to_string().contains("not found"));
    }
}
