//! Tunnel CLI commands
//!
//! Handles: pvpn connect/disconnect/status

use anyhow::bail;
use pvpn_core::{Direction, Supervisor, TransitionResult};
use std::collections::BTreeMap;

use super::resolve_profile;

pub async fn connect(supervisor: &Supervisor, identifier: &str) -> anyhow::Result<()> {
    transition(supervisor, identifier, Direction::Up).await
}

pub async fn disconnect(supervisor: &Supervisor, identifier: &str) -> anyhow::Result<()> {
    transition(supervisor, identifier, Direction::Down).await
}

async fn transition(
    supervisor: &Supervisor,
    identifier: &str,
    direction: Direction,
) -> anyhow::Result<()> {
    let id = resolve_profile(supervisor, identifier);
    let result = supervisor.request_transition(&id, direction).await;
    report(identifier, &result)
}

/// Print a transition result; failures become errors
pub fn report(identifier: &str, result: &TransitionResult) -> anyhow::Result<()> {
    if !result.ok {
        bail!("{identifier}: {}", result.message);
    }
    println!("{identifier}: {} [{}]", result.message, result.status);
    Ok(())
}

/// Print the id -> status map
pub fn status(supervisor: &Supervisor, json: bool) -> anyhow::Result<()> {
    let statuses: BTreeMap<_, _> = supervisor.status_map().into_iter().collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    if statuses.is_empty() {
        println!("No profiles found.");
    }
    for (id, status) in statuses {
        println!("  {id}: {status}");
    }
    Ok(())
}
