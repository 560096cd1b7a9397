//! Supervisor configuration
//!
//! Values come from, lowest precedence first: built-in defaults, the
//! optional `<data-dir>/config.toml`, then `PVPN_*` environment variables.
//! Front ends apply their own flags on top.
//!
//! ```toml
//! helper = "sudo"
//! helper_args = ["wg-quick"]
//! connect_timeout_ms = 25000
//! log_capacity = 200
//! ```

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::event_log::DEFAULT_LOG_CAPACITY;
use crate::helper::{HelperCommand, DEFAULT_HELPER, DEFAULT_TIMEOUT};
use crate::profile::store::PROFILES_FILE;

/// Name of the optional configuration file inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

pub const ENV_DATA_DIR: &str = "PVPN_DATA_DIR";
pub const ENV_HELPER: &str = "PVPN_HELPER";
pub const ENV_TIMEOUT_MS: &str = "PVPN_TIMEOUT_MS";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    helper: Option<String>,
    helper_args: Option<Vec<String>>,
    connect_timeout_ms: Option<u64>,
    log_capacity: Option<usize>,
}

/// Settings for a `Supervisor`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Directory holding `profiles.json` and `config.toml`
    pub data_dir: PathBuf,
    /// Helper executable
    pub helper: String,
    /// Arguments inserted before `<up|down> <config>`
    pub helper_args: Vec<String>,
    /// Time allowed for one helper invocation
    pub connect_timeout: Duration,
    /// Maximum number of event log entries kept
    pub log_capacity: usize,
}

impl SupervisorConfig {
    /// Defaults rooted at the given data directory
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            helper: DEFAULT_HELPER.to_string(),
            helper_args: Vec::new(),
            connect_timeout: DEFAULT_TIMEOUT,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }

    /// Resolve the data directory, then layer `config.toml` and the
    /// environment over the defaults.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be read or
    /// parsed, or an environment variable holds an invalid value.
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(data_dir, |key| std::env::var(key).ok())
    }

    /// Same as `load`, reading variables through `env`
    ///
    /// # Errors
    /// See `load`.
    pub fn load_with_env(
        data_dir: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let data_dir = data_dir
            .or_else(|| env(ENV_DATA_DIR).map(PathBuf::from))
            .unwrap_or_else(default_data_dir);

        let mut config = Self::with_data_dir(data_dir);
        config.merge_file()?;
        config.merge_env(env)?;
        Ok(config)
    }

    fn merge_file(&mut self) -> Result<(), ConfigError> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(());
        }

        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let file: FileConfig =
            toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })?;

        if let Some(helper) = file.helper {
            self.helper = helper;
        }
        if let Some(args) = file.helper_args {
            self.helper_args = args;
        }
        if let Some(ms) = file.connect_timeout_ms {
            self.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(capacity) = file.log_capacity {
            self.log_capacity = capacity;
        }
        Ok(())
    }

    fn merge_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        // A helper named in the environment is a complete command on its own
        if let Some(helper) = env(ENV_HELPER).filter(|h| !h.trim().is_empty()) {
            self.helper = helper;
            self.helper_args.clear();
        }
        if let Some(raw) = env(ENV_TIMEOUT_MS) {
            let ms = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_TIMEOUT_MS.to_string(),
                    value: raw.clone(),
                })?;
            self.connect_timeout = Duration::from_millis(ms);
        }
        Ok(())
    }

    /// Path of the optional TOML file
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Path of the profile collection
    #[must_use]
    pub fn profiles_path(&self) -> PathBuf {
        self.data_dir.join(PROFILES_FILE)
    }

    /// Helper invocation described by this configuration
    #[must_use]
    pub fn helper_command(&self) -> HelperCommand {
        HelperCommand::new(self.helper.clone())
            .with_args(self.helper_args.clone())
            .with_timeout(self.connect_timeout)
    }
}

/// Get the application data directory
///
/// `$HOME/.pvpn` when a home directory is known, otherwise a directory
/// under the system temp dir.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    if let Some(home) = dirs::home_dir() {
        return home.join(".pvpn");
    }

    let temp = std::env::temp_dir().join("pvpn-data");
    tracing::warn!(
        "could not determine home directory, using temporary location {}",
        temp.display()
    );
    temp
}
