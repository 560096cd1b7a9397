//! Profile file storage
//!
//! Profiles live in a single JSON array at `<data-dir>/profiles.json`:
//!
//! ```json
//! [{ "id": "...", "name": "Home", "configPath": "/etc/wireguard/home.conf", "status": "disconnected" }]
//! ```
//!
//! The `status` field mirrors the live status so the file reflects the last
//! observed state, but it is never trusted on load.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::types::{new_profile_id, ConnectionStatus, Profile};
use crate::error::{AddProfileError, StoreError, ValidationError};

/// File name of the profile collection inside the data directory
pub const PROFILES_FILE: &str = "profiles.json";

/// Record written when no profile file exists yet
const SEED_NAME: &str = "Home server";
const SEED_CONFIG_PATH: &str = "/etc/wireguard/home.conf";

/// On-disk shape of a profile, tolerant of missing fields
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    config_path: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordRef<'a> {
    id: &'a str,
    name: &'a str,
    config_path: &'a str,
    status: ConnectionStatus,
}

/// Result of a successful load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadSummary {
    /// Number of profiles read
    pub loaded: usize,
    /// Records that were missing an id
    pub generated_ids: usize,
    /// Whether the file was rewritten to fix ids or stale statuses
    pub healed: bool,
    /// Whether the file did not exist and was seeded
    pub seeded: bool,
}

/// Durable list of profiles with their last persisted status
pub struct ProfileStore {
    path: PathBuf,
    profiles: Vec<(Profile, ConnectionStatus)>,
}

impl ProfileStore {
    /// Create a store backed by the given file. Nothing is read until `load`.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            profiles: Vec::new(),
        }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the profile file, replacing the in-memory collection.
    ///
    /// A missing file is created with one seed record. Every status is reset
    /// to disconnected; records without an id get one. If anything had to be
    /// fixed the file is rewritten immediately.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or written back.
    /// A read or parse failure leaves the collection empty; a failed
    /// write-back keeps the profiles that were read.
    pub fn load(&mut self) -> Result<LoadSummary, StoreError> {
        self.profiles.clear();

        let mut summary = LoadSummary::default();
        if !self.path.exists() {
            self.profiles.push((
                Profile::new(SEED_NAME.to_string(), SEED_CONFIG_PATH.to_string()),
                ConnectionStatus::Disconnected,
            ));
            self.save()?;
            summary.loaded = 1;
            summary.seeded = true;
            return Ok(summary);
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        let records: Vec<RawRecord> =
            serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;

        let mut stale_status = false;
        for record in records {
            let id = match record.id.filter(|id| !id.trim().is_empty()) {
                Some(id) => id,
                None => {
                    summary.generated_ids += 1;
                    new_profile_id()
                }
            };
            if record
                .status
                .as_deref()
                .is_some_and(|status| status != "disconnected")
            {
                stale_status = true;
            }
            self.profiles.push((
                Profile {
                    id,
                    name: record.name.unwrap_or_default(),
                    config_path: record.config_path.unwrap_or_default(),
                },
                ConnectionStatus::Disconnected,
            ));
        }

        summary.loaded = self.profiles.len();
        if summary.generated_ids > 0 || stale_status {
            self.save()?;
            summary.healed = true;
        }
        Ok(summary)
    }

    /// Write the whole collection, replacing the previous file contents
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save(&self) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let records: Vec<RecordRef<'_>> = self
            .profiles
            .iter()
            .map(|(p, status)| RecordRef {
                id: &p.id,
                name: &p.name,
                config_path: &p.config_path,
                status: *status,
            })
            .collect();
        let content =
            serde_json::to_string_pretty(&records).map_err(|source| StoreError::Serialize {
                path: self.path.clone(),
                source,
            })?;

        // Write next to the target and rename so readers never see half a file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(io_err)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                tracing::warn!("could not remove {}: {cleanup}", tmp.display());
            }
            return Err(io_err(e));
        }
        Ok(())
    }

    /// Validate and append a new profile, then persist.
    ///
    /// # Errors
    /// Returns a validation error if either field is blank, or a store error
    /// if persisting fails (the profile is kept in memory).
    pub fn add(&mut self, name: &str, config_path: &str) -> Result<Profile, AddProfileError> {
        let name = name.trim();
        let config_path = config_path.trim();
        if name.is_empty() || config_path.is_empty() {
            return Err(ValidationError(
                "name and configuration file path are required".to_string(),
            )
            .into());
        }

        let profile = Profile::new(name.to_string(), config_path.to_string());
        self.profiles
            .push((profile.clone(), ConnectionStatus::Disconnected));
        self.save()?;
        Ok(profile)
    }

    /// Remove a profile. Returns the removed profile, `None` if it was absent.
    ///
    /// # Errors
    /// Returns an error if persisting fails after removal
    pub fn remove(&mut self, id: &str) -> Result<Option<Profile>, StoreError> {
        let Some(index) = self.profiles.iter().position(|(p, _)| p.id == id) else {
            return Ok(None);
        };
        let (profile, _) = self.profiles.remove(index);
        self.save()?;
        Ok(Some(profile))
    }

    /// Mirror a status into the persisted record and save
    ///
    /// # Errors
    /// Returns an error if persisting fails
    pub fn set_status(&mut self, id: &str, status: ConnectionStatus) -> Result<(), StoreError> {
        match self.profiles.iter_mut().find(|(p, _)| p.id == id) {
            Some((_, persisted)) => {
                *persisted = status;
                self.save()
            }
            None => Ok(()),
        }
    }

    /// Look up a profile by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().map(|(p, _)| p).find(|p| p.id == id)
    }

    /// All profiles in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter().map(|(p, _)| p)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ProfileStore {
        ProfileStore::new(dir.path().join(PROFILES_FILE))
    }

    #[test]
    fn test_missing_file_is_seeded() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let summary = store.load().unwrap();
        assert!(summary.seeded);
        assert_eq!(store.len(), 1);
        assert!(store.path().exists());

        let seed = store.iter().next().unwrap();
        assert_eq!(seed.name, SEED_NAME);
        assert!(!seed.id.is_empty());
    }

    #[test]
    fn test_load_generates_missing_ids_and_heals() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PROFILES_FILE);
        fs::write(
            &path,
            r#"[{"name":"Work","configPath":"/etc/wg/work.conf","status":"connected"}]"#,
        )
        .unwrap();

        let mut store = store_in(&dir);
        let summary = store.load().unwrap();
        assert_eq!(summary.generated_ids, 1);
        assert!(summary.healed);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["status"], "disconnected");
        assert!(raw[0]["id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[test]
    fn test_load_clean_file_is_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PROFILES_FILE);
        let content =
            r#"[{"id":"p1","name":"Work","configPath":"/etc/wg/work.conf","status":"disconnected"}]"#;
        fs::write(&path, content).unwrap();

        let mut store = store_in(&dir);
        let summary = store.load().unwrap();
        assert!(!summary.healed);
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_load_garbage_falls_back_to_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROFILES_FILE), "{not json").unwrap();

        let mut store = store_in(&dir);
        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_rejects_blank_fields() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        assert!(matches!(
            store.add("   ", "/etc/wg/a.conf"),
            Err(AddProfileError::Validation(_))
        ));
        assert!(matches!(store.add("Home", ""), Err(AddProfileError::Validation(_))));
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_add_then_reload_keeps_identity() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let added = store.add("  Home ", "/etc/wg/home.conf").unwrap();
        assert_eq!(added.name, "Home");
        store
            .set_status(&added.id, ConnectionStatus::Connected)
            .unwrap();

        let mut reloaded = store_in(&dir);
        reloaded.load().unwrap();
        let profile = reloaded.get(&added.id).unwrap();
        assert_eq!(profile, &added);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(reloaded.path()).unwrap()).unwrap();
        assert_eq!(raw[0]["status"], "disconnected");
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join(PROFILES_FILE);
        // A non-empty directory in the way makes the rename fail
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();

        let mut store = store_in(&dir);
        assert!(matches!(
            store.add("Home", "/etc/wg/home.conf"),
            Err(AddProfileError::Store(StoreError::Io { .. }))
        ));
        assert!(!dir.path().join("profiles.json.tmp").exists());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        assert!(store.remove("missing").unwrap().is_none());

        let added = store.add("Home", "/etc/wg/home.conf").unwrap();
        assert_eq!(store.remove(&added.id).unwrap(), Some(added));
        assert!(store.is_empty());
    }
}
