//! Remote product service - CRUD over the hosted `products` table.
//!
//! A thin pass-through: rows are mapped between the snake_case wire shape in
//! [`crate::entities::product`] and the in-app [`Product`]. Missing rows are
//! `None`, never an error. Database failures propagate as
//! [`Error::Database`] for the caller to display. There are no retries.

use crate::{
    core::id::generate_id,
    entities::{Product as ProductEntity, ProductColumn, product},
    errors::{Error, Result},
    models::{Gender, NewProduct, PLACEHOLDER_IMAGE_URL, Product, ProductStatus},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info, instrument};

fn labels_to_json(labels: Option<Vec<String>>) -> Option<Json> {
    labels.map(|items| Json::Array(items.into_iter().map(Json::String).collect()))
}

fn json_to_labels(value: Option<Json>) -> Option<Vec<String>> {
    value.and_then(|json| serde_json::from_value(json).ok())
}

impl From<product::Model> for Product {
    fn from(row: product::Model) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            old_price: row.old_price,
            image_url: row
                .image_url
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string()),
            category: row.category,
            description: row.description.unwrap_or_default(),
            colors: json_to_labels(row.colors),
            sizes: json_to_labels(row.sizes),
            purchase_link: row.link,
            published_at: row.published_at,
            status: ProductStatus::from_wire(row.status.as_deref()),
            gender: Gender::from_wire(row.gender.as_deref()),
        }
    }
}

/// Copies the editable draft fields onto an active model.
fn apply_draft(model: &mut product::ActiveModel, draft: NewProduct) {
    model.name = Set(draft.name.trim().to_string());
    model.price = Set(draft.price);
    model.old_price = Set(draft.old_price);
    model.image_url = Set(draft.image_url);
    model.category = Set(draft.category);
    model.description = Set(draft.description);
    model.colors = Set(labels_to_json(draft.colors));
    model.sizes = Set(labels_to_json(draft.sizes));
    model.link = Set(draft.purchase_link);
    model.status = Set(Some(draft.status.unwrap_or_default().as_str().to_string()));
    model.gender = Set(Some(draft.gender.unwrap_or_default().as_str().to_string()));
}

/// Lists every product, newest `published_at` first.
///
/// # Errors
/// Returns an error if the database query fails.
#[instrument(skip(db))]
pub async fn list_products(db: &DatabaseConnection) -> Result<Vec<Product>> {
    let rows = ProductEntity::find()
        .order_by_desc(ProductColumn::PublishedAt)
        .all(db)
        .await?;
    debug!("Fetched {} remote products", rows.len());
    Ok(rows.into_iter().map(Product::from).collect())
}

/// Fetches one product; `Ok(None)` when no row has this id.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<Product>> {
    let row = ProductEntity::find_by_id(id.to_string()).one(db).await?;
    Ok(row.map(Product::from))
}

/// Inserts a new product and returns it as stored.
///
/// The id comes from the local generator and `published_at` is set to now.
///
/// # Errors
/// Returns an error if:
/// - The name or category is empty
/// - The price or old price is negative or not finite
/// - The database insert fails
#[instrument(skip(db, draft), fields(name = %draft.name))]
pub async fn create_product(db: &DatabaseConnection, draft: NewProduct) -> Result<Product> {
    draft.validate()?;
    let now = Utc::now();

    let mut model = product::ActiveModel {
        id: Set(generate_id()),
        published_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    apply_draft(&mut model, draft);

    let row = model.insert(db).await?;
    info!("Created remote product {}", row.id);
    Ok(row.into())
}

/// Replaces the editable fields of an existing product.
///
/// `published_at` is kept (or set to now if the row never had one).
///
/// # Errors
/// Returns an error if:
/// - Validation fails as for [`create_product`]
/// - No product has this id ([`Error::ProductNotFound`])
/// - The database update fails
#[instrument(skip(db, draft))]
pub async fn update_product(db: &DatabaseConnection, id: &str, draft: NewProduct) -> Result<Product> {
    draft.validate()?;

    let existing = ProductEntity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::ProductNotFound { id: id.to_string() })?;
    let published_at = existing.published_at.unwrap_or_else(Utc::now);

    let mut model: product::ActiveModel = existing.into();
    apply_draft(&mut model, draft);
    model.published_at = Set(Some(published_at));
    model.updated_at = Set(Utc::now());

    let row = model.update(db).await?;
    info!("Updated remote product {}", row.id);
    Ok(row.into())
}

/// Deletes a product. Deleting an id that does not exist is not an error.
///
/// # Errors
/// Returns an error if the database delete fails.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, id: &str) -> Result<()> {
    let result = ProductEntity::delete_by_id(id.to_string()).exec(db).await?;
    debug!("Deleted {} remote rows for {}", result.rows_affected, id);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::setup_test_db;
    use chrono::{Duration, TimeZone};

    fn draft(name: &str, price: f64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price,
            category: "Camisetas".to_string(),
            colors: Some(vec!["Preto".to_string(), "Branco".to_string()]),
            ..Default::default()
        }
    }

    async fn insert_row(db: &DatabaseConnection, id: &str, published_days: Option<i64>) {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        product::ActiveModel {
            id: Set(id.to_string()),
            name: Set(format!("Row {id}")),
            price: Set(10.0),
            old_price: Set(None),
            image_url: Set(None),
            category: Set("Misc".to_string()),
            description: Set(None),
            colors: Set(None),
            sizes: Set(None),
            link: Set(None),
            published_at: Set(published_days.map(|d| base + Duration::days(d))),
            status: Set(None),
            gender: Set(None),
            created_at: Set(base),
            updated_at: Set(base),
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_product(&db, draft("", 10.0)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_product(&db, draft("Camiseta", -10.0)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidPrice { amount } if amount == -10.0
        ));

        let result = create_product(&db, draft("Camiseta", f64::INFINITY)).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidPrice { .. }));

        assert!(list_products(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_product(&db, draft("Camiseta Básica", 49.9)).await?;

        assert!(crate::core::id::id_timestamp(&created.id).is_some());
        assert!(created.published_at.is_some());
        assert_eq!(created.status, ProductStatus::Active);
        assert_eq!(created.gender, Gender::Unisex);
        assert_eq!(created.image_url, PLACEHOLDER_IMAGE_URL);

        let fetched = get_product_by_id(&db, &created.id).await?.unwrap();
        assert_eq!(fetched.name, "Camiseta Básica");
        assert_eq!(fetched.price, 49.9);
        assert_eq!(
            fetched.colors,
            Some(vec!["Preto".to_string(), "Branco".to_string()])
        );

        assert!(get_product_by_id(&db, "does-not-exist").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_null_wire_fields_get_defaults() -> Result<()> {
        let db = setup_test_db().await?;
        insert_row(&db, "bare", None).await;

        let fetched = get_product_by_id(&db, "bare").await?.unwrap();
        assert_eq!(fetched.status, ProductStatus::Active);
        assert_eq!(fetched.gender, Gender::Unisex);
        assert_eq!(fetched.description, "");
        assert_eq!(fetched.image_url, PLACEHOLDER_IMAGE_URL);
        assert!(fetched.colors.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_orders_by_published_desc() -> Result<()> {
        let db = setup_test_db().await?;
        insert_row(&db, "old", Some(0)).await;
        insert_row(&db, "newest", Some(10)).await;
        insert_row(&db, "middle", Some(5)).await;

        let listed = list_products(&db).await?;
        let ids: Vec<&str> = listed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "middle", "old"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_product() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_product(&db, draft("Original", 10.0)).await?;

        let mut changes = draft("Renamed", 15.0);
        changes.status = Some(ProductStatus::Inactive);
        changes.gender = Some(Gender::Female);
        let updated = update_product(&db, &created.id, changes).await?;

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.price, 15.0);
        assert_eq!(updated.status, ProductStatus::Inactive);
        assert_eq!(updated.gender, Gender::Female);
        assert_eq!(updated.published_at, created.published_at);

        let missing = update_product(&db, "nope", draft("X", 1.0)).await;
        assert!(matches!(missing.unwrap_err(), Error::ProductNotFound { id } if id == "nope"));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_product(&db, draft("Temp", 5.0)).await?;

        delete_product(&db, &created.id).await?;
        assert!(get_product_by_id(&db, &created.id).await?.is_none());

        // Deleting again is fine.
        delete_product(&db, &created.id).await?;
        Ok(())
    }
}
