//! pvpn core - WireGuard profile supervisor
//!
//! This crate keeps a persisted list of WireGuard profiles and runs the
//! external helper (`wg-quick` by default) to bring tunnels up and down,
//! allowing at most one helper per profile at a time.
//!
//! - [`profile`]: profile types and the JSON-backed store
//! - [`status`]: live connection status per profile
//! - [`event_log`]: bounded user-facing event log
//! - [`registry`]: in-flight helper processes
//! - [`helper`]: helper process execution
//! - [`supervisor`]: the public surface tying these together

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod error;
pub mod event_log;
pub mod helper;
pub mod profile;
pub mod registry;
pub mod status;
pub mod supervisor;

pub use config::SupervisorConfig;
pub use error::{AddProfileError, HelperError, TransitionError, ValidationError};
pub use event_log::{LogEntry, LogLevel};
pub use profile::{ConnectionStatus, Direction, Profile, ProfileView, TransitionResult};
pub use supervisor::Supervisor;
