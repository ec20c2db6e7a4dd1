//! Directory-backed slots: one file per key.
//!
//! Used by the runner so the product list survives restarts and can be shared
//! between processes. There is no native change event across processes;
//! subscribers pick up foreign writes through polling.

use super::StoragePort;
use crate::errors::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Slot storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Opens (creating if needed) the slot directory.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the directory cannot be created.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        debug!("Opened file storage at {:?}", root);
        Ok(Self { root })
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::storage(key, "slot keys must be [A-Za-z0-9_-]+"));
        }
        Ok(self.root.join(format!("{key}.slot")))
    }
}

impl StoragePort for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage(key, e.to_string())),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        // Write-then-rename so a concurrent reader never sees a torn slot. The
        // temp name is unique per writer so concurrent writers never share one.
        let tmp = self.root.join(format!(
            "{key}.slot.{}-{:08x}.tmp",
            std::process::id(),
            rand::random::<u32>()
        ));
        let written = fs::write(&tmp, value).and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(Error::storage(key, e.to_string()));
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(key, e.to_string())),
        }
    }
}
