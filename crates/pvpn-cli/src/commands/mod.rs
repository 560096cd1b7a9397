//! CLI command handlers
//!
//! Each group of subcommands has its own module; `shell` reuses them for
//! the interactive session.

pub mod logs;
pub mod profile;
pub mod shell;
pub mod tunnel;

use pvpn_core::Supervisor;

/// Resolve a profile given by ID or display name.
///
/// Unknown identifiers are returned unchanged so the supervisor reports
/// them as missing.
pub fn resolve_profile(supervisor: &Supervisor, identifier: &str) -> String {
    let profiles = supervisor.list_profiles();
    if profiles.iter().any(|p| p.id == identifier) {
        return identifier.to_string();
    }
    profiles
        .into_iter()
        .find(|p| p.name == identifier)
        .map_or_else(|| identifier.to_string(), |p| p.id)
}
