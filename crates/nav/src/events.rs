//! Event Bus - run outcomes broadcast to whoever is listening
//!
//! Design: plain enum events over a tokio broadcast channel.
//! Publishing never blocks and never fails the run.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events emitted once per injector run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavEvent {
    /// The page is the fragment itself
    Skipped { run_id: Uuid, path: String },
    /// The fragment was absent (non-success status or empty body)
    FragmentMissing { run_id: Uuid, url: String },
    /// The fragment source failed at the transport level
    FetchFailed {
        run_id: Uuid,
        url: String,
        error: String,
    },
    Inserted { run_id: Uuid, rewritten: usize },
    /// Structural or DOM failure; the page document was not modified
    Failed { run_id: Uuid, error: String },
}

impl NavEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            NavEvent::Skipped { run_id, .. }
            | NavEvent::FragmentMissing { run_id, .. }
            | NavEvent::FetchFailed { run_id, .. }
            | NavEvent::Inserted { run_id, .. }
            | NavEvent::Failed { run_id, .. } => *run_id,
        }
    }
}

/// Simple event bus using tokio broadcast channel
pub struct EventBus {
    tx: broadcast::Sender<NavEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self { tx }
    }

    /// Publish an event
    pub fn publish(&self, event: NavEvent) {
        let _ = self.tx.send(event); // Ignore error if no subscribers
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<NavEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
