//! In-flight helper processes, keyed by profile id
//!
//! The registry is the mutual-exclusion point for transitions: a profile
//! can have at most one entry, and an entry exists exactly while a helper
//! invocation for that profile is being set up or running.

use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::oneshot;

use crate::profile::Direction;

/// Identifies one reservation so a finished helper never releases a newer one
pub type Ticket = u64;

/// Handle on a registered helper invocation
#[derive(Debug)]
pub struct InFlight {
    ticket: Ticket,
    direction: Direction,
    started: Instant,
    pid: Option<u32>,
    terminate: Option<oneshot::Sender<()>>,
}

impl InFlight {
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// OS process id, once the helper has been spawned
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    #[must_use]
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Ask the helper task to kill its process. Returns false if it already finished.
    fn signal(mut self) -> bool {
        self.terminate
            .take()
            .is_some_and(|tx| tx.send(()).is_ok())
    }
}

/// Receiving half of a reservation, held by the task running the helper
#[derive(Debug)]
pub struct Reservation {
    pub ticket: Ticket,
    pub terminated: oneshot::Receiver<()>,
}

/// Map from profile id to in-flight helper
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    entries: HashMap<String, InFlight>,
    next_ticket: Ticket,
}

impl ProcessRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Register a new in-flight operation for `id`.
    ///
    /// Returns `None` without touching the existing entry if one is
    /// already registered.
    pub fn set(&mut self, id: &str, direction: Direction) -> Option<Reservation> {
        if self.has(id) {
            return None;
        }

        let (tx, rx) = oneshot::channel();
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.entries.insert(
            id.to_string(),
            InFlight {
                ticket,
                direction,
                started: Instant::now(),
                pid: None,
                terminate: Some(tx),
            },
        );
        Some(Reservation {
            ticket,
            terminated: rx,
        })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&InFlight> {
        self.entries.get(id)
    }

    /// Attach the spawned process id to a reservation
    pub fn set_pid(&mut self, id: &str, ticket: Ticket, pid: Option<u32>) {
        if let Some(entry) = self.entries.get_mut(id).filter(|e| e.ticket == ticket) {
            entry.pid = pid;
        }
    }

    /// Remove the entry for `id` if it still belongs to `ticket`
    pub fn release(&mut self, id: &str, ticket: Ticket) -> bool {
        if self.entries.get(id).is_some_and(|e| e.ticket == ticket) {
            self.entries.remove(id);
            true
        } else {
            false
        }
    }

    /// Remove the entry for `id` without signalling its helper
    pub fn delete(&mut self, id: &str) -> Option<InFlight> {
        self.entries.remove(id)
    }

    /// Signal the registered process to terminate, then remove the entry.
    ///
    /// Returns true if a running helper was signalled.
    pub fn terminate(&mut self, id: &str) -> bool {
        self.delete(id).is_some_and(InFlight::signal)
    }

    /// Ids with a helper currently registered
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
