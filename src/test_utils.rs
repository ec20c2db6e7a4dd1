//! Shared test utilities.
//!
//! Helpers for building stores over in-memory slots, storage backends that
//! fail on demand, sample products, and an in-memory `SQLite` database for
//! the remote product service.

use crate::{
    core::{bus::ChangeBus, catalog::Catalog, store::LocalProductStore},
    errors::{Error, Result},
    models::{Gender, PLACEHOLDER_IMAGE_URL, Product, ProductStatus},
    storage::{MemoryStorage, SharedStorage, StoragePort},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with the `products` table.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A store over a fresh in-memory page, plus that page's storage handle.
///
/// The page is attached to the store's bus, so the store only hears its own
/// writes through synthetic events.
pub fn memory_store(catalog: Catalog) -> (LocalProductStore, SharedStorage) {
    init_test_tracing();
    let bus = ChangeBus::new();
    let storage: SharedStorage = Arc::new(MemoryStorage::new().attach(&bus));
    let store = LocalProductStore::new(Arc::clone(&storage), Arc::new(catalog), bus);
    (store, storage)
}

/// An undated, active product with predictable fields.
///
/// # Defaults
/// * `name`: `"Product <id>"`
/// * `price`: 10.0
/// * `category`: `"Misc"`
pub fn sample_product(id: &str) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {id}"),
        price: 10.0,
        old_price: None,
        image_url: PLACEHOLDER_IMAGE_URL.to_string(),
        category: "Misc".to_string(),
        description: String::new(),
        colors: None,
        sizes: None,
        purchase_link: None,
        published_at: None,
        status: ProductStatus::Active,
        gender: Gender::Unisex,
    }
}

/// Ids of `products`, in order.
pub fn ids(products: &[Product]) -> Vec<&str> {
    products.iter().map(|p| p.id.as_str()).collect()
}

/// Storage whose every operation fails, like a browser with storage disabled.
#[derive(Debug, Clone, Copy)]
pub struct FailingStorage;

impl StoragePort for FailingStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Err(Error::storage(key, "storage unavailable"))
    }

    fn set_item(&self, key: &str, _value: &str) -> Result<()> {
        Err(Error::storage(key, "storage unavailable"))
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        Err(Error::storage(key, "storage unavailable"))
    }
}

/// Readable storage that rejects writes, like an exceeded quota.
#[derive(Debug, Clone)]
pub struct ReadOnlyStorage {
    inner: MemoryStorage,
}

impl ReadOnlyStorage {
    /// Wraps `inner`, passing reads through.
    pub const fn new(inner: MemoryStorage) -> Self {
        Self { inner }
    }
}

impl StoragePort for ReadOnlyStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, _value: &str) -> Result<()> {
        Err(Error::storage(key, "quota exceeded"))
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        Err(Error::storage(key, "quota exceeded"))
    }
}
