//! In-process storage shared between "pages".
//!
//! A [`MemoryStorage`] value is a handle onto one shared slot map. Handles
//! created with [`MemoryStorage::attach`] behave like browser tabs: when one of
//! them physically changes a slot, every *other* attached page receives a
//! native [`StorageEvent`] on its bus. The writer's own page does not.

use super::StoragePort;
use crate::core::bus::{ChangeBus, StorageEvent};
use crate::errors::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Default)]
struct Shared {
    slots: HashMap<String, String>,
    pages: Vec<(u64, ChangeBus)>,
    next_page: u64,
}

/// Handle onto an in-memory slot map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    shared: Arc<Mutex<Shared>>,
    page: Option<u64>,
}

impl MemoryStorage {
    /// Creates an empty backend and returns a detached handle onto it.
    ///
    /// Writes through a detached handle notify every attached page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new page on the same backend, delivering native events to `bus`.
    #[must_use]
    pub fn attach(&self, bus: &ChangeBus) -> Self {
        let mut shared = self.shared.lock();
        let page = shared.next_page;
        shared.next_page += 1;
        shared.pages.push((page, bus.clone()));
        trace!(page, "Attached page to memory storage");
        Self {
            shared: Arc::clone(&self.shared),
            page: Some(page),
        }
    }

    /// Number of slots currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock().slots.len()
    }

    /// `true` when no slot holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn broadcast_native(&self, shared: &Shared, key: &str) {
        for (page, bus) in &shared.pages {
            if Some(*page) != self.page {
                bus.publish(StorageEvent::native(key));
            }
        }
    }
}

impl StoragePort for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.shared.lock().slots.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut shared = self.shared.lock();
        let previous = shared.slots.insert(key.to_string(), value.to_string());
        if previous.as_deref() != Some(value) {
            self.broadcast_native(&shared, key);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut shared = self.shared.lock();
        if shared.slots.remove(key).is_some() {
            self.broadcast_native(&shared, key);
        }
        Ok(())
    }
}
