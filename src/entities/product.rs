//! Product entity - the wire shape of the remote `products` table.
//!
//! Column names are snake_case and several columns are nullable where the
//! in-app shape has defaults (`image_url`, `description`, `status`, `gender`).
//! `colors` and `sizes` are JSON arrays of strings. Conversion to and from
//! [`crate::models::Product`] lives in [`crate::core::remote`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Opaque product id, assigned on create
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name
    pub name: String,
    /// Current price
    pub price: f64,
    /// Previous price, for the discount badge
    pub old_price: Option<f64>,
    /// `NULL` reads as the placeholder image
    pub image_url: Option<String>,
    /// Grouping label
    pub category: String,
    /// `NULL` reads as empty
    pub description: Option<String>,
    /// JSON array of color labels
    pub colors: Option<Json>,
    /// JSON array of size labels
    pub sizes: Option<Json>,
    /// Purchase link
    pub link: Option<String>,
    /// Set on create, preserved on update
    pub published_at: Option<DateTimeUtc>,
    /// `active` or `inactive`
    pub status: Option<String>,
    /// `male`, `female` or `unisex`
    pub gender: Option<String>,
    /// Row creation time
    pub created_at: DateTimeUtc,
    /// Last write time
    pub updated_at: DateTimeUtc,
}

/// Products have no relationships with other tables
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
