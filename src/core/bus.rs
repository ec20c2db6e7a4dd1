//! Page-level change bus.
//!
//! Both kinds of storage notification travel over the same bus: native events
//! raised by the storage backend when another page changes a slot, and
//! synthetic events the notifier publishes so listeners on the writing page
//! hear about its own writes. Listeners do not need to tell them apart.

use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 64;

/// Where a storage event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    /// Raised by the storage backend for a write made on another page
    Native,
    /// Published by this page after its own write
    Synthetic,
}

/// A slot changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Key of the slot that changed
    pub key: String,
    /// Native or synthetic
    pub source: EventSource,
}

impl StorageEvent {
    /// Event for a write made on another page.
    #[must_use]
    pub fn native(key: &str) -> Self {
        Self {
            key: key.to_string(),
            source: EventSource::Native,
        }
    }

    /// Event for a write made on this page.
    #[must_use]
    pub fn synthetic(key: &str) -> Self {
        Self {
            key: key.to_string(),
            source: EventSource::Synthetic,
        }
    }
}

/// Broadcast channel for [`StorageEvent`]s on one page.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<StorageEvent>,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeBus {
    /// Creates a bus with the default backlog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a bus whose slow listeners lag after `capacity` pending events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Delivers `event` to every current listener and returns how many there were.
    pub fn publish(&self, event: StorageEvent) -> usize {
        trace!(key = %event.key, source = ?event.source, "Publishing storage event");
        // A send error only means nobody is listening.
        self.sender.send(event).unwrap_or(0)
    }

    /// Starts listening. Only events published after this call are received.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }

    /// Number of live receivers.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
