//! Connection supervisor
//!
//! Owns the profile store, live statuses, event log and process registry,
//! and drives one helper invocation per connect/disconnect request.
//!
//! ```rust,ignore
//! let supervisor = Supervisor::open(&SupervisorConfig::load(None)?);
//! let profiles = supervisor.add_profile("Home", "/etc/wireguard/home.conf")?;
//! let result = supervisor.connect(&profiles[0].id).await;
//! if !result.ok {
//!     eprintln!("{}", result.message);
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

use crate::config::SupervisorConfig;
use crate::error::{AddProfileError, HelperError, StoreError, TransitionError};
use crate::event_log::{EventLog, LogEntry};
use crate::helper::HelperCommand;
use crate::profile::{
    ConnectionStatus, Direction, LoadSummary, Profile, ProfileStore, ProfileView,
    TransitionResult,
};
use crate::registry::{ProcessRegistry, Reservation, Ticket};
use crate::status::StatusTracker;

/// Mutable state shared by every handle to one supervisor
struct State {
    store: ProfileStore,
    statuses: StatusTracker,
    log: EventLog,
    registry: ProcessRegistry,
}

impl State {
    /// Update the live status and mirror it to disk
    fn set_status(&mut self, id: &str, status: ConnectionStatus) {
        self.statuses.set(id, status);
        if let Err(e) = self.store.set_status(id, status) {
            self.log_store_error(&e);
        }
    }

    fn log_store_error(&mut self, err: &StoreError) {
        self.log.error(format!("Failed to save profiles: {err}"));
    }

    fn views(&self) -> Vec<ProfileView> {
        self.store
            .iter()
            .map(|p| ProfileView::new(p, self.statuses.get(&p.id)))
            .collect()
    }
}

/// Handle to the supervision core. Cloning is cheap and shares state.
#[derive(Clone)]
pub struct Supervisor {
    state: Arc<Mutex<State>>,
    helper: Arc<HelperCommand>,
}

impl Supervisor {
    /// Create a supervisor without reading the profile file
    #[must_use]
    pub fn new(config: &SupervisorConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                store: ProfileStore::new(config.profiles_path()),
                statuses: StatusTracker::new(),
                log: EventLog::new(config.log_capacity),
                registry: ProcessRegistry::new(),
            })),
            helper: Arc::new(config.helper_command()),
        }
    }

    /// Create a supervisor and load its profiles
    #[must_use]
    pub fn open(config: &SupervisorConfig) -> Self {
        let supervisor = Self::new(config);
        supervisor.reload();
        supervisor
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock cannot leave the maps half-updated
        // in a way later calls depend on, so recover the guard
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-read the profile file.
    ///
    /// Failures are logged and leave an empty (or partially healed)
    /// collection; they never propagate.
    pub fn reload(&self) -> Option<LoadSummary> {
        let mut state = self.lock();
        let result = state.store.load();
        let ids: Vec<String> = state.store.iter().map(|p| p.id.clone()).collect();
        state.statuses.initialize(ids.iter().map(String::as_str));

        match result {
            Ok(summary) => {
                info!(
                    path = %state.store.path().display(),
                    loaded = summary.loaded,
                    healed = summary.healed,
                    "profiles loaded"
                );
                Some(summary)
            }
            Err(e) => {
                state.log.error(format!("Failed to load profiles: {e}"));
                None
            }
        }
    }

    /// Every profile with its live status
    #[must_use]
    pub fn list_profiles(&self) -> Vec<ProfileView> {
        self.lock().views()
    }

    /// Add a profile and return the updated listing.
    ///
    /// # Errors
    /// Returns a validation error for blank fields, or a store error if the
    /// profile file could not be written.
    pub fn add_profile(
        &self,
        name: &str,
        config_path: &str,
    ) -> Result<Vec<ProfileView>, AddProfileError> {
        let mut state = self.lock();
        let profile = match state.store.add(name, config_path) {
            Ok(profile) => profile,
            Err(AddProfileError::Store(e)) => {
                state.log_store_error(&e);
                return Err(AddProfileError::Store(e));
            }
            Err(e) => return Err(e),
        };

        state
            .statuses
            .set(&profile.id, ConnectionStatus::Disconnected);
        state
            .log
            .info(format!("Profile added: {}", profile.name));
        Ok(state.views())
    }

    /// Remove a profile, terminating any helper still running for it.
    /// Unknown ids are ignored.
    pub fn delete_profile(&self, id: &str) -> Vec<ProfileView> {
        let mut state = self.lock();
        let running_for = state.registry.get(id).map(|entry| entry.started().elapsed());
        if state.registry.terminate(id) {
            info!(id, ?running_for, "terminated in-flight helper for removed profile");
        }

        match state.store.remove(id) {
            Ok(Some(profile)) => {
                state
                    .log
                    .info(format!("Profile removed: {}", profile.name));
            }
            Ok(None) => debug!(id, "delete of unknown profile ignored"),
            Err(e) => state.log_store_error(&e),
        }
        state.statuses.remove(id);
        state.views()
    }

    /// Bring the profile's tunnel up
    pub async fn connect(&self, id: &str) -> TransitionResult {
        self.request_transition(id, Direction::Up).await
    }

    /// Take the profile's tunnel down
    pub async fn disconnect(&self, id: &str) -> TransitionResult {
        self.request_transition(id, Direction::Down).await
    }

    /// Run one connect or disconnect for `id`.
    ///
    /// Refusals (unknown profile, operation in progress, missing config,
    /// wrong state) change nothing. Otherwise the profile goes to
    /// `connecting` and the helper's classified outcome is returned.
    ///
    /// The transition runs on its own task: dropping the returned future
    /// stops waiting for the result, but the helper still runs to an outcome
    /// and the registry entry is always released.
    pub async fn request_transition(&self, id: &str, direction: Direction) -> TransitionResult {
        let task = tokio::spawn(self.clone().run_transition(id.to_string(), direction));
        match task.await {
            Ok(result) => result,
            Err(e) => task_failed(id, &e),
        }
    }

    async fn run_transition(self, id: String, direction: Direction) -> TransitionResult {
        let begun = {
            let id = id.clone();
            self.off_loop(move |s| s.begin(&id, direction)).await
        };
        let (profile, reservation) = match begun {
            Ok(Ok(started)) => started,
            Ok(Err(refused)) => return refused,
            Err(e) => return task_failed(&id, &e),
        };
        let ticket = reservation.ticket;

        let outcome = self
            .helper
            .run(
                direction,
                &profile.config_path,
                reservation.terminated,
                |pid| self.lock().registry.set_pid(&id, ticket, pid),
            )
            .await;

        match self
            .off_loop(move |s| s.finish(&profile, direction, ticket, outcome))
            .await
        {
            Ok(result) => result,
            Err(e) => task_failed(&id, &e),
        }
    }

    /// Run a locked section that may write the profile file on the blocking pool
    async fn off_loop<T, F>(&self, f: F) -> Result<T, JoinError>
    where
        T: Send + 'static,
        F: FnOnce(&Supervisor) -> T + Send + 'static,
    {
        let this = self.clone();
        tokio::task::spawn_blocking(move || f(&this)).await
    }

    /// Validate the request and reserve the registry slot in one critical section
    fn begin(
        &self,
        id: &str,
        direction: Direction,
    ) -> Result<(Profile, Reservation), TransitionResult> {
        let mut state = self.lock();
        let current = state.statuses.get(id);
        let refuse = |err: TransitionError| {
            debug!(id, %direction, code = err.code(), "transition refused");
            TransitionResult::failure(current, err.to_string())
        };

        let Some(profile) = state.store.get(id).cloned() else {
            return Err(refuse(TransitionError::ProfileNotFound { id: id.to_string() }));
        };
        if state.registry.has(id) {
            return Err(refuse(TransitionError::OperationInProgress));
        }
        if profile.config_path.trim().is_empty() {
            return Err(refuse(TransitionError::InvalidConfig));
        }
        match direction {
            Direction::Up if current == ConnectionStatus::Connected || current.is_transient() => {
                return Err(refuse(TransitionError::AlreadyInState));
            }
            Direction::Down if current != ConnectionStatus::Connected => {
                return Err(refuse(TransitionError::NotConnected));
            }
            _ => {}
        }

        let Some(reservation) = state.registry.set(id, direction) else {
            return Err(refuse(TransitionError::OperationInProgress));
        };

        // Both directions report the same transient label
        state.set_status(id, ConnectionStatus::Connecting);
        let verb = match direction {
            Direction::Up => "Connecting",
            Direction::Down => "Disconnecting",
        };
        state
            .log
            .info(format!("{verb} {} ({})...", profile.name, profile.config_path));
        Ok((profile, reservation))
    }

    /// Apply a helper outcome: unregister, update status, log, build the result
    fn finish(
        &self,
        profile: &Profile,
        direction: Direction,
        ticket: Ticket,
        outcome: Result<String, HelperError>,
    ) -> TransitionResult {
        let mut state = self.lock();
        state.registry.release(&profile.id, ticket);
        let still_known = state.store.get(&profile.id).is_some();

        let err = match outcome {
            Ok(output) => {
                let status = direction.target_status();
                if still_known {
                    state.set_status(&profile.id, status);
                }
                let message = match direction {
                    Direction::Up => "Connected",
                    Direction::Down => "Disconnected",
                };
                debug!(output = output.trim(), "helper succeeded");
                state.log.info(format!("{}: {}", profile.name, message.to_lowercase()));
                return TransitionResult::success(status, message);
            }
            Err(err) => err,
        };

        let entry = match &err {
            HelperError::NotFound { helper } => format!("Helper '{helper}' not found"),
            HelperError::Timeout { after_ms } => {
                format!("{}: helper timed out after {after_ms} ms", profile.name)
            }
            HelperError::Cancelled => {
                format!("{}: operation cancelled, profile removed", profile.name)
            }
            HelperError::Spawn(_) | HelperError::Exit { .. } => {
                format!("{}: {err}", profile.name)
            }
        };
        warn!(id = %profile.id, code = err.code(), "{entry}");
        state.log.error(entry);
        if still_known {
            state.set_status(&profile.id, ConnectionStatus::Error);
        }
        TransitionResult::failure(ConnectionStatus::Error, err.to_string())
    }

    /// Live status of every profile
    #[must_use]
    pub fn status_map(&self) -> HashMap<String, ConnectionStatus> {
        self.lock().statuses.snapshot()
    }

    /// Current status of one profile
    #[must_use]
    pub fn status(&self, id: &str) -> ConnectionStatus {
        self.lock().statuses.get(id)
    }

    /// Log entries oldest first. Reading records a refresh entry.
    #[must_use]
    pub fn logs(&self) -> Vec<LogEntry> {
        self.lock().log.list()
    }

    /// Empty the event log
    pub fn clear_logs(&self) {
        self.lock().log.clear();
    }

    /// Whether a helper is registered for `id`
    #[must_use]
    pub fn is_in_flight(&self, id: &str) -> bool {
        self.lock().registry.has(id)
    }

    /// Profile ids with a helper currently registered
    #[must_use]
    pub fn in_flight(&self) -> Vec<String> {
        self.lock().registry.ids().map(str::to_string).collect()
    }
}

fn task_failed(id: &str, err: &JoinError) -> TransitionResult {
    error!(id, "transition task failed: {err}");
    TransitionResult::failure(ConnectionStatus::Error, format!("Internal error: {err}"))
}
