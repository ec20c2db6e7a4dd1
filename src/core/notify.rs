//! Change notification after product writes.
//!
//! `notify` stamps the last-update slot and publishes a synthetic storage event
//! for the product slot on this page's bus. Other pages learn about the write
//! from the backend's native events or, failing that, from polling the stamp.

use crate::core::bus::{ChangeBus, StorageEvent};
use crate::errors::Outcome;
use crate::storage::{LAST_UPDATE_KEY, PRODUCTS_KEY, SharedStorage};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use tracing::{debug, warn};

/// Formats a stamp the way the last-update slot stores it (`2024-01-01T00:00:00.000Z`).
#[must_use]
pub fn format_stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored stamp; `None` for anything that is not RFC 3339.
#[must_use]
pub fn parse_stamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

/// Reads the raw last-update value. Read failures count as "no value".
#[must_use]
pub fn read_last_update(storage: &SharedStorage) -> Option<String> {
    match storage.get_item(LAST_UPDATE_KEY) {
        Ok(value) => value,
        Err(e) => {
            debug!("Could not read last-update slot: {}", e);
            None
        }
    }
}

/// Stamps writes and tells same-page listeners about them.
#[derive(Clone)]
pub struct ChangeNotifier {
    storage: SharedStorage,
    bus: ChangeBus,
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl ChangeNotifier {
    /// Stamps `storage` and announces on `bus`.
    #[must_use]
    pub const fn new(storage: SharedStorage, bus: ChangeBus) -> Self {
        Self { storage, bus }
    }

    /// The bus synthetic events go to.
    #[must_use]
    pub const fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    /// Signals that the product slot was just written.
    ///
    /// Returns the stamp written, or a degraded `None` when the stamp could
    /// not be stored. The synthetic event is published either way.
    pub fn notify(&self) -> Outcome<Option<DateTime<Utc>>> {
        self.notify_at(Utc::now())
    }

    /// [`notify`](Self::notify) with an explicit clock reading.
    pub fn notify_at(&self, now: DateTime<Utc>) -> Outcome<Option<DateTime<Utc>>> {
        let stamp = self.next_stamp(now);
        let written = self.storage.set_item(LAST_UPDATE_KEY, &format_stamp(stamp));

        let listeners = self.bus.publish(StorageEvent::synthetic(PRODUCTS_KEY));
        debug!(listeners, stamp = %format_stamp(stamp), "Product change notified");

        match written {
            Ok(()) => Outcome::Complete(Some(stamp)),
            Err(e) => {
                warn!("Failed to record last product update: {}", e);
                Outcome::Degraded {
                    value: None,
                    reason: e,
                }
            }
        }
    }

    // Pollers compare stamps by value, so two writes within the same
    // millisecond must still produce different stamps.
    fn next_stamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let now = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);
        let previous = read_last_update(&self.storage).as_deref().and_then(parse_stamp);
        match previous {
            Some(prev) if prev >= now => prev + Duration::milliseconds(1),
            _ => now,
        }
    }
}
