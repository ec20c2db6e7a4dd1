//! Local product store.
//!
//! Owns the `produtos` slot: the whole product list serialized as one JSON
//! array. Reads never fail outward. A missing or malformed slot is reseeded
//! from the baseline catalog, and an unreadable one degrades to the baseline
//! in memory. Every successful write goes through the change notifier.
//!
//! Writes replace the list wholesale. Two pages doing read-modify-write at the
//! same time can lose one page's change (last writer wins); nothing here
//! detects that.

use crate::core::bus::ChangeBus;
use crate::core::catalog::Catalog;
use crate::core::id::generate_id;
use crate::core::notify::ChangeNotifier;
use crate::errors::{Error, Outcome, Result};
use crate::models::{NewProduct, Product};
use crate::storage::{PRODUCTS_KEY, SharedStorage};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Product list persisted in one key-value slot.
#[derive(Clone)]
pub struct LocalProductStore {
    storage: SharedStorage,
    catalog: Arc<Catalog>,
    notifier: ChangeNotifier,
}

impl std::fmt::Debug for LocalProductStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProductStore")
            .field("catalog_len", &self.catalog.len())
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl LocalProductStore {
    /// Creates a store over `storage`, seeding from `catalog` and notifying on `bus`.
    #[must_use]
    pub fn new(storage: SharedStorage, catalog: Arc<Catalog>, bus: ChangeBus) -> Self {
        let notifier = ChangeNotifier::new(Arc::clone(&storage), bus);
        Self {
            storage,
            catalog,
            notifier,
        }
    }

    /// The slot backend.
    #[must_use]
    pub const fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Baseline used for seeding and reconciliation.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Bus the store's own writes are announced on.
    #[must_use]
    pub const fn bus(&self) -> &ChangeBus {
        self.notifier.bus()
    }

    /// Reads and parses the product slot.
    ///
    /// `Ok(None)` when the slot was never written. A parse failure is
    /// [`Error::Serialization`]; a backend failure is [`Error::Storage`].
    pub(crate) fn read_slot(&self) -> Result<Option<Vec<Product>>> {
        let Some(raw) = self.storage.get_item(PRODUCTS_KEY)? else {
            return Ok(None);
        };
        let products = serde_json::from_str(&raw)?;
        Ok(Some(products))
    }

    /// Returns the persisted product list, seeding it from the baseline catalog
    /// when the slot is absent or malformed.
    #[instrument(skip(self))]
    pub fn load(&self) -> Outcome<Vec<Product>> {
        match self.read_slot() {
            Ok(Some(products)) => {
                debug!("Loaded {} products from local slot", products.len());
                Outcome::Complete(products)
            }
            Ok(None) => {
                info!("No stored products, seeding {} from catalog", self.catalog.len());
                match self.try_save(self.catalog.products().to_vec()) {
                    Ok(seeded) => Outcome::Complete(seeded),
                    Err(e) => self.degrade_to_catalog(e),
                }
            }
            Err(reason @ Error::Serialization(_)) => {
                warn!("Stored products are malformed, reseeding: {}", reason);
                match self.try_save(self.catalog.products().to_vec()) {
                    Ok(seeded) => Outcome::Degraded {
                        value: seeded,
                        reason,
                    },
                    Err(e) => self.degrade_to_catalog(e),
                }
            }
            Err(e) => self.degrade_to_catalog(e),
        }
    }

    fn degrade_to_catalog(&self, reason: Error) -> Outcome<Vec<Product>> {
        error!("Falling back to in-memory catalog: {}", reason);
        Outcome::Degraded {
            value: self.catalog.products().to_vec(),
            reason,
        }
    }

    /// Persists `products` wholesale. Returns `false` when the write failed.
    pub fn save(&self, products: Vec<Product>) -> bool {
        match self.try_save(products) {
            Ok(_) => true,
            Err(e) => {
                error!("Failed to save products: {}", e);
                false
            }
        }
    }

    /// [`save`](Self::save) with the failure exposed. Returns the list as stored.
    ///
    /// # Errors
    /// [`Error::Serialization`] or [`Error::Storage`] when nothing was written.
    pub fn try_save(&self, products: Vec<Product>) -> Result<Vec<Product>> {
        self.try_save_at(products, Utc::now())
    }

    /// Stamps undated records with `now`, writes the list and notifies.
    #[instrument(skip(self, products), fields(count = products.len()))]
    pub(crate) fn try_save_at(
        &self,
        mut products: Vec<Product>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Product>> {
        for product in &mut products {
            product.published_at.get_or_insert(now);
        }
        let payload = serde_json::to_string(&products)?;
        self.storage.set_item(PRODUCTS_KEY, &payload)?;
        let _ = self.notifier.notify();
        debug!("Saved {} products", products.len());
        Ok(products)
    }

    /// Current list, degraded or not.
    #[must_use]
    pub fn list(&self) -> Vec<Product> {
        self.load().into_inner()
    }

    /// Finds a product by id; `None` when absent.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Product> {
        self.list().into_iter().find(|p| p.id == id)
    }

    /// Adds a product from an admin form.
    ///
    /// Assigns a fresh id, `publishedAt = now` and the default status.
    ///
    /// # Errors
    /// Validation errors, or the write failure.
    pub fn create(&self, draft: NewProduct) -> Result<Product> {
        draft.validate()?;
        let now = Utc::now();
        let product = Product::from_draft(generate_id(), draft, now);
        let mut products = self.list();
        products.push(product.clone());
        self.try_save_at(products, now)?;
        info!("Created product '{}' ({})", product.name, product.id);
        Ok(product)
    }

    /// Replaces the product with the same id.
    ///
    /// # Errors
    /// - Validation errors for the new field values
    /// - [`Error::ProductNotFound`] if no product has this id
    /// - the write failure
    pub fn update(&self, product: Product) -> Result<Product> {
        NewProduct::from(product.clone()).validate()?;
        let mut products = self.list();
        let slot = products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| Error::ProductNotFound {
                id: product.id.clone(),
            })?;
        *slot = product.clone();
        let stored = self.try_save(products)?;
        info!("Updated product {}", product.id);
        Ok(stored
            .into_iter()
            .find(|p| p.id == product.id)
            .unwrap_or(product))
    }

    /// Removes the product with this id. `Ok(false)` when it was not there.
    ///
    /// # Errors
    /// The write failure.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let products = self.list();
        let before = products.len();
        let remaining: Vec<Product> = products.into_iter().filter(|p| p.id != id).collect();
        if remaining.len() == before {
            debug!("Delete of unknown product {} ignored", id);
            return Ok(false);
        }
        self.try_save(remaining)?;
        info!("Deleted product {}", id);
        Ok(true)
    }
}
