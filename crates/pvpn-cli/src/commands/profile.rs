//! Profile CLI commands
//!
//! Handles: pvpn list/add/delete

use anyhow::bail;
use pvpn_core::{ProfileView, Supervisor};
use std::io::{self, Write};

use super::resolve_profile;

/// Print every profile with its live status
pub fn list(supervisor: &Supervisor, json: bool) -> anyhow::Result<()> {
    let profiles = supervisor.list_profiles();
    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
    } else {
        print_profiles(&profiles);
    }
    Ok(())
}

pub fn print_profiles(profiles: &[ProfileView]) {
    if profiles.is_empty() {
        println!("No profiles found.");
        return;
    }
    println!("Profiles:");
    for p in profiles {
        println!("  {} - {} ({}) [{}]", p.id, p.name, p.config_path, p.status);
    }
}

/// Add a profile and print the updated listing
pub fn add(supervisor: &Supervisor, name: &str, config_path: &str) -> anyhow::Result<()> {
    let profiles = supervisor.add_profile(name, config_path)?;
    if let Some(added) = profiles.last() {
        println!("Added profile: {} ({})", added.name, added.id);
    }
    Ok(())
}

/// Delete a profile, asking for confirmation unless `force` is set
pub fn delete(supervisor: &Supervisor, identifier: &str, force: bool) -> anyhow::Result<()> {
    let id = resolve_profile(supervisor, identifier);
    let Some(profile) = supervisor
        .list_profiles()
        .into_iter()
        .find(|p| p.id == id)
    else {
        bail!("Profile not found: {identifier}");
    };

    if !force {
        print!("Delete profile '{}' (ID: {})? [y/N] ", profile.name, profile.id);
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    supervisor.delete_profile(&profile.id);
    println!("Deleted profile: {}", profile.name);
    Ok(())
}
