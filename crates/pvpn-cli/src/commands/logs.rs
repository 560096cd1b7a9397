//! Event log CLI commands

use pvpn_core::Supervisor;

/// Print the event log, oldest entry first
pub fn show(supervisor: &Supervisor, json: bool) -> anyhow::Result<()> {
    let entries = supervisor.logs();
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!("{}", entry.format());
        }
    }
    Ok(())
}

pub fn clear(supervisor: &Supervisor) {
    supervisor.clear_logs();
    println!("Logs cleared.");
}
