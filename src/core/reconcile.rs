//! Reconciliation of the local product list with seed sources.
//!
//! Seeds (the baseline catalog, or the remote product list) are unioned into
//! the persisted list by id. An id already present locally always wins: seed
//! records never overwrite local edits and there is no field-level merge.
//! Because membership is by id only, reconciling twice in a row writes at
//! most once.

use crate::core::remote;
use crate::core::store::LocalProductStore;
use crate::errors::{Error, Outcome};
use crate::models::Product;
use sea_orm::DatabaseConnection;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Ids appended from the seed, in seed order
    pub appended: Vec<String>,
    /// Length of the list after the pass
    pub total: usize,
}

impl MergeReport {
    /// `true` when the pass wrote to the store.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.appended.is_empty()
    }
}

/// Appends every `incoming` record whose id is not in `existing`.
///
/// Returns the merged list and the appended ids. Existing order is kept and
/// appended records follow in `incoming` order. Repeated ids inside
/// `incoming` are appended once.
#[must_use]
pub fn merge_by_id(existing: Vec<Product>, incoming: &[Product]) -> (Vec<Product>, Vec<String>) {
    let mut seen: HashSet<String> = existing.iter().map(|p| p.id.clone()).collect();
    let mut merged = existing;
    let mut appended = Vec::new();
    for product in incoming {
        if seen.insert(product.id.clone()) {
            appended.push(product.id.clone());
            merged.push(product.clone());
        }
    }
    (merged, appended)
}

/// Tops the persisted list up with the store's baseline catalog.
pub fn merge_and_ensure(store: &LocalProductStore) -> Outcome<MergeReport> {
    let catalog = store.catalog().products().to_vec();
    merge_from(store, &catalog)
}

/// Unions `seed` into the persisted list and saves if anything was appended.
///
/// A malformed slot counts as empty (and is reported as degraded). An
/// unreadable slot leaves storage untouched.
#[instrument(skip(store, seed), fields(seed_len = seed.len()))]
pub fn merge_from(store: &LocalProductStore, seed: &[Product]) -> Outcome<MergeReport> {
    let (current, parse_failure) = match store.read_slot() {
        Ok(Some(products)) => (products, None),
        Ok(None) => (Vec::new(), None),
        Err(reason @ Error::Serialization(_)) => {
            warn!("Stored products are malformed, reconciling from empty: {}", reason);
            (Vec::new(), Some(reason))
        }
        Err(reason) => {
            warn!("Cannot read stored products, skipping reconciliation: {}", reason);
            return Outcome::Degraded {
                value: MergeReport::default(),
                reason,
            };
        }
    };

    let before = current.len();
    let (merged, appended) = merge_by_id(current, seed);
    if appended.is_empty() {
        debug!("Reconciliation found nothing to append");
        return Outcome::Complete(MergeReport {
            appended,
            total: before,
        });
    }

    match store.try_save(merged) {
        Ok(saved) => {
            info!("Reconciliation appended {} products", appended.len());
            let report = MergeReport {
                appended,
                total: saved.len(),
            };
            match parse_failure {
                Some(reason) => Outcome::Degraded {
                    value: report,
                    reason,
                },
                None => Outcome::Complete(report),
            }
        }
        Err(reason) => {
            warn!("Reconciliation could not be saved: {}", reason);
            Outcome::Degraded {
                value: MergeReport {
                    appended: Vec::new(),
                    total: before,
                },
                reason,
            }
        }
    }
}

/// Pulls the remote product list and unions it into the local store.
///
/// A remote failure leaves the local list untouched and is reported as degraded.
pub async fn merge_remote(store: &LocalProductStore, db: &DatabaseConnection) -> Outcome<MergeReport> {
    match remote::list_products(db).await {
        Ok(products) => merge_from(store, &products),
        Err(reason) => {
            warn!("Remote product list unavailable: {}", reason);
            let total = store.read_slot().ok().flatten().map_or(0, |p| p.len());
            Outcome::Degraded {
                value: MergeReport {
                    appended: Vec::new(),
                    total,
                },
                reason,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::catalog::Catalog;
    use crate::core::notify::read_last_update;
    use crate::models::NewProduct;
    use crate::core::bus::ChangeBus;
    use crate::storage::{LAST_UPDATE_KEY, MemoryStorage, PRODUCTS_KEY, SharedStorage, StoragePort};
    use crate::test_utils::{
        FailingStorage, ReadOnlyStorage, ids, memory_store, sample_product, setup_test_db,
    };
    use std::sync::Arc;

    fn stored(storage: &SharedStorage) -> Vec<Product> {
        serde_json::from_str(&storage.get_item(PRODUCTS_KEY).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn test_merge_by_id_keeps_existing_on_shared_id() {
        let mut local_a = sample_product("a");
        local_a.name = "Edited locally".to_string();
        let mut seed_a = sample_product("a");
        seed_a.name = "Seed version".to_string();

        let (merged, appended) = merge_by_id(
            vec![local_a.clone(), sample_product("b")],
            &[seed_a, sample_product("c"), sample_product("c")],
        );
        assert_eq!(ids(&merged), vec!["a", "b", "c"]);
        assert_eq!(merged[0], local_a);
        assert_eq!(appended, vec!["c".to_string()]);
    }

    #[test]
    fn test_merge_by_id_never_drops_distinct_ids() {
        let existing: Vec<Product> = (0..20).map(|i| sample_product(&format!("l{i}"))).collect();
        let incoming: Vec<Product> = (0..20).map(|i| sample_product(&format!("s{i}"))).collect();
        let (merged, appended) = merge_by_id(existing, &incoming);
        assert_eq!(merged.len(), 40);
        assert_eq!(appended.len(), 20);
    }

    #[test]
    fn test_example_scenario() {
        let catalog = Catalog::new(vec![sample_product("1"), sample_product("2")]);
        let (store, storage) = memory_store(catalog);

        assert_eq!(ids(&store.load().into_inner()), vec!["1", "2"]);
        assert_eq!(ids(&stored(&storage)), vec!["1", "2"]);

        let a = stored(&storage)[0].clone();
        assert!(store.save(vec![a, sample_product("3")]));
        assert_eq!(ids(&stored(&storage)), vec!["1", "3"]);

        let report = merge_and_ensure(&store);
        assert!(!report.is_degraded());
        assert_eq!(report.value().appended, vec!["2".to_string()]);
        assert_eq!(ids(&stored(&storage)), vec!["1", "3", "2"]);

        let stamp = read_last_update(&storage);
        let again = merge_and_ensure(&store).into_inner();
        assert!(!again.changed());
        assert_eq!(again.total, 3);
        assert_eq!(ids(&stored(&storage)), vec!["1", "3", "2"]);
        assert_eq!(read_last_update(&storage), stamp);
    }

    #[test]
    fn test_merge_and_ensure_is_idempotent_from_empty() {
        let (store, storage) = memory_store(Catalog::builtin());
        let first = merge_and_ensure(&store).into_inner();
        assert_eq!(first.appended.len(), 5);
        let after_first = stored(&storage);

        let second = merge_and_ensure(&store).into_inner();
        assert!(!second.changed());
        assert_eq!(stored(&storage), after_first);
    }

    #[test]
    fn test_changed_seed_definition_does_not_reinsert() {
        let (store, storage) = memory_store(Catalog::new(vec![sample_product("1")]));
        let _ = merge_and_ensure(&store);

        let mut redefined = sample_product("1");
        redefined.name = "New seed name".to_string();
        let report = merge_from(&store, &[redefined]).into_inner();
        assert!(!report.changed());
        assert_eq!(stored(&storage)[0].name, "Product 1");
    }

    #[test]
    fn test_malformed_slot_reconciles_from_empty() {
        let (store, storage) = memory_store(Catalog::new(vec![sample_product("1")]));
        storage.set_item(PRODUCTS_KEY, "[{\"id\": 5}]").unwrap();

        let outcome = merge_and_ensure(&store);
        assert!(outcome.is_degraded());
        assert_eq!(outcome.value().appended, vec!["1".to_string()]);
        assert_eq!(ids(&stored(&storage)), vec!["1"]);
    }

    #[tokio::test]
    async fn test_merge_remote_appends_remote_only_records() {
        let db = setup_test_db().await.unwrap();
        let remote_product = remote::create_product(
            &db,
            NewProduct {
                name: "Jaqueta".to_string(),
                price: 249.9,
                category: "Casacos".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let (store, storage) = memory_store(Catalog::new(vec![sample_product("1")]));
        let _ = store.load();

        let report = merge_remote(&store, &db).await;
        assert!(!report.is_degraded());
        assert_eq!(report.value().appended, vec![remote_product.id.clone()]);
        assert_eq!(ids(&stored(&storage)), vec!["1", remote_product.id.as_str()]);

        let again = merge_remote(&store, &db).await.into_inner();
        assert!(!again.changed());
    }

    #[test]
    fn test_odd_field_values_are_not_reconciled_away() {
        let (store, storage) = memory_store(Catalog::new(vec![sample_product("1")]));
        storage
            .set_item(
                PRODUCTS_KEY,
                r#"[{"id":"user-a","name":"A","price":5,"category":"X","status":"draft"}]"#,
            )
            .unwrap();

        let outcome = merge_and_ensure(&store);
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.value().appended, vec!["1".to_string()]);
        assert_eq!(ids(&stored(&storage)), vec!["user-a", "1"]);
    }

    #[test]
    fn test_unreadable_storage_skips_reconciliation() {
        let storage: SharedStorage = Arc::new(FailingStorage);
        let store = LocalProductStore::new(
            storage,
            Arc::new(Catalog::new(vec![sample_product("1")])),
            ChangeBus::new(),
        );

        let outcome = merge_and_ensure(&store);
        assert!(outcome.is_degraded());
        assert!(matches!(outcome.reason(), Some(Error::Storage { .. })));
        assert_eq!(outcome.into_inner(), MergeReport::default());
    }

    #[test]
    fn test_rejected_write_leaves_slot_untouched() {
        let backend = MemoryStorage::new();
        let existing = serde_json::to_string(&vec![sample_product("9")]).unwrap();
        backend.set_item(PRODUCTS_KEY, &existing).unwrap();

        let storage: SharedStorage = Arc::new(ReadOnlyStorage::new(backend.clone()));
        let store = LocalProductStore::new(
            storage,
            Arc::new(Catalog::new(vec![sample_product("1")])),
            ChangeBus::new(),
        );

        let outcome = merge_from(&store, &[sample_product("2"), sample_product("3")]);
        assert!(outcome.is_degraded());
        assert!(matches!(outcome.reason(), Some(Error::Storage { .. })));
        let report = outcome.into_inner();
        assert!(!report.changed());
        assert_eq!(report.total, 1);

        assert_eq!(backend.get_item(PRODUCTS_KEY).unwrap(), Some(existing));
        assert!(backend.get_item(LAST_UPDATE_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_merge_remote_database_error_leaves_local_list() {
        // No products table, so every query fails.
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        let (store, storage) = memory_store(Catalog::new(vec![sample_product("1")]));
        let _ = store.load();
        let before = storage.get_item(PRODUCTS_KEY).unwrap();
        let stamp = read_last_update(&storage);

        let outcome = merge_remote(&store, &db).await;
        assert!(outcome.is_degraded());
        assert!(matches!(outcome.reason(), Some(Error::Database(_))));
        assert_eq!(outcome.value().total, 1);
        assert!(!outcome.value().changed());

        assert_eq!(storage.get_item(PRODUCTS_KEY).unwrap(), before);
        assert_eq!(read_last_update(&storage), stamp);
    }
}
