//! Events pushed to observers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{LibraryItem, LibraryReport, Recommendation};

/// Something observers should know about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscoveryEvent {
    /// A new run started; drop previously shown results.
    ResultsCleared,
    /// One newly accepted recommendation, in discovery order.
    ResultAdded { recommendation: Recommendation },
    /// A recommendation's status changed after an add attempt.
    ResultUpdated { recommendation: Recommendation },
    /// Library snapshot after a refresh (successful or not).
    LibraryRefreshed(LibraryReport),
    /// A pass found nothing new.
    SearchExhausted { title: String, message: String },
    /// A start request was rejected.
    StartFailed {
        reason: String,
        items: Vec<LibraryItem>,
        running: bool,
    },
    /// User-facing notice.
    Notification { title: String, message: String },
}

impl DiscoveryEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            DiscoveryEvent::ResultsCleared => "results_cleared",
            DiscoveryEvent::ResultAdded { .. } => "result_added",
            DiscoveryEvent::ResultUpdated { .. } => "result_updated",
            DiscoveryEvent::LibraryRefreshed(_) => "library_refreshed",
            DiscoveryEvent::SearchExhausted { .. } => "search_exhausted",
            DiscoveryEvent::StartFailed { .. } => "start_failed",
            DiscoveryEvent::Notification { .. } => "notification",
        }
    }
}

/// Fan-out of discovery events using a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<DiscoveryEvent>,
}

impl EventBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send an event to every subscriber.
    pub fn emit(&self, event: DiscoveryEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(1024)
    }
}
