//! Client-side session flags.
//!
//! `hasVisited` gates the one-time welcome screen and `isAdmin` marks an admin
//! session. Both are plain slots the client can edit freely, so `isAdmin` is a
//! convenience flag only and never an authorization check.

use crate::storage::{HAS_VISITED_KEY, IS_ADMIN_KEY, SharedStorage};
use tracing::{debug, warn};

const TRUE: &str = "true";

/// Boolean-ish flags stored next to the product list.
#[derive(Clone)]
pub struct SessionFlags {
    storage: SharedStorage,
}

impl std::fmt::Debug for SessionFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFlags").finish_non_exhaustive()
    }
}

impl SessionFlags {
    /// Flags stored in `storage`.
    #[must_use]
    pub const fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    fn flag(&self, key: &str) -> bool {
        match self.storage.get_item(key) {
            Ok(value) => value.as_deref() == Some(TRUE),
            Err(e) => {
                warn!("Could not read flag {}: {}", key, e);
                false
            }
        }
    }

    fn set_flag(&self, key: &str, on: bool) -> bool {
        let written = if on {
            self.storage.set_item(key, TRUE)
        } else {
            self.storage.remove_item(key)
        };
        match written {
            Ok(()) => {
                debug!(key, on, "Session flag updated");
                true
            }
            Err(e) => {
                warn!("Could not update flag {}: {}", key, e);
                false
            }
        }
    }

    /// `true` once the welcome screen has been shown.
    #[must_use]
    pub fn has_visited(&self) -> bool {
        self.flag(HAS_VISITED_KEY)
    }

    /// Records that the welcome screen was shown. Returns `false` if it could not be stored.
    pub fn mark_visited(&self) -> bool {
        self.set_flag(HAS_VISITED_KEY, true)
    }

    /// `true` during an admin session.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.flag(IS_ADMIN_KEY)
    }

    /// Enters or leaves the admin session. Returns `false` if it could not be stored.
    pub fn set_admin(&self, admin: bool) -> bool {
        self.set_flag(IS_ADMIN_KEY, admin)
    }
}
