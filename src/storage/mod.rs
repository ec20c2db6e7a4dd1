//! Key-value persistence port.
//!
//! Every persisted slot the storefront uses (product list, last-update stamp,
//! session flags) goes through [`StoragePort`], so stores can run against the
//! in-memory backend in tests and the file backend in the runner.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::errors::Result;
use std::sync::Arc;

/// Slot holding the serialized product list.
pub const PRODUCTS_KEY: &str = "produtos";
/// Slot holding the ISO-8601 stamp of the last product write.
pub const LAST_UPDATE_KEY: &str = "produtos_ultima_atualizacao";
/// Older name of the last-update slot, still honored by listeners.
pub const LEGACY_LAST_UPDATE_KEY: &str = "last_update";
/// One-time welcome screen flag.
pub const HAS_VISITED_KEY: &str = "hasVisited";
/// Client-side admin session flag. Not a security boundary.
pub const IS_ADMIN_KEY: &str = "isAdmin";

/// Synchronous string slots, scoped to one browser-profile equivalent.
pub trait StoragePort: Send + Sync {
    /// Reads a slot; `Ok(None)` when it was never written.
    ///
    /// # Errors
    /// Returns [`crate::errors::Error::Storage`] when the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Writes a slot, replacing any previous value.
    ///
    /// # Errors
    /// Returns [`crate::errors::Error::Storage`] when the backend rejects the write.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Clears a slot. Clearing a missing slot is not an error.
    ///
    /// # Errors
    /// Returns [`crate::errors::Error::Storage`] when the backend rejects the removal.
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Shared handle type used by the stores.
pub type SharedStorage = Arc<dyn StoragePort>;
