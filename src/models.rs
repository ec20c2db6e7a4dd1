//! In-app product shape.
//!
//! This is what the local `produtos` slot holds (serialized camelCase) and what
//! every read site works with. The database row shape lives in
//! [`crate::entities::product`]; conversions sit in [`crate::core::remote`].

use crate::errors::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Image shown when a product has none.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/150";

/// Whether a product is listed in the storefront.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// Listed in the storefront
    #[default]
    Active,
    /// Kept in the admin list but hidden from shoppers
    Inactive,
}

impl ProductStatus {
    /// Wire token, identical to the serde representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Resolves an optional wire token, defaulting unknown or missing values.
    ///
    /// The Portuguese tokens written by older clients (`ativo`, `inativo`) are
    /// accepted as aliases.
    #[must_use]
    pub fn from_wire(token: Option<&str>) -> Self {
        match token.map(str::trim) {
            Some("inactive" | "inativo") => Self::Inactive,
            _ => Self::Active,
        }
    }
}

/// Audience a product is shown to. Display filtering only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Men's section
    Male,
    /// Women's section
    Female,
    /// Shown in both sections
    #[default]
    Unisex,
}

impl Gender {
    /// Wire token, identical to the serde representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unisex => "unisex",
        }
    }

    /// Resolves an optional wire token; anything unrecognized is unisex.
    #[must_use]
    pub fn from_wire(token: Option<&str>) -> Self {
        match token.map(str::trim) {
            Some("male" | "masculino") => Self::Male,
            Some("female" | "feminino") => Self::Female,
            _ => Self::Unisex,
        }
    }
}

fn placeholder_image() -> String {
    PLACEHOLDER_IMAGE_URL.to_string()
}

// Stored records come from older clients and hand edits, so a single odd field
// must not make the whole list unreadable. These read any JSON value and fall
// back to the field default.

fn wire_token<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_str().map(ToString::to_string)))
}

fn lenient_status<'de, D>(deserializer: D) -> std::result::Result<ProductStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(ProductStatus::from_wire(wire_token(deserializer)?.as_deref()))
}

fn lenient_gender<'de, D>(deserializer: D) -> std::result::Result<Gender, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Gender::from_wire(wire_token(deserializer)?.as_deref()))
}

fn lenient_image_url<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(wire_token(deserializer)?
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(placeholder_image))
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(wire_token(deserializer)?.unwrap_or_default())
}

/// A storefront product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Opaque unique id, never reassigned
    pub id: String,
    /// Display name
    pub name: String,
    /// Current price, never negative
    pub price: f64,
    /// Previous price, only used to show a discount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_price: Option<f64>,
    /// Product image, [`PLACEHOLDER_IMAGE_URL`] when missing or blank
    #[serde(default = "placeholder_image", deserialize_with = "lenient_image_url")]
    pub image_url: String,
    /// Free-text grouping label, empty when missing
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: String,
    /// Long description, empty when missing
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    /// Color options offered to the shopper
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    /// Size options offered to the shopper
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<String>>,
    /// External URL the "buy" action opens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_link: Option<String>,
    /// Drives "new" badges and recency sorting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Missing, null or unknown tokens read as [`ProductStatus::Active`]
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: ProductStatus,
    /// Missing, null or unknown tokens read as [`Gender::Unisex`]
    #[serde(default, deserialize_with = "lenient_gender")]
    pub gender: Gender,
}

impl Product {
    /// Builds a record from a draft with an already-assigned id and timestamp.
    #[must_use]
    pub fn from_draft(id: String, draft: NewProduct, published_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            price: draft.price,
            old_price: draft.old_price,
            image_url: draft
                .image_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(placeholder_image),
            category: draft.category,
            description: draft.description.unwrap_or_default(),
            colors: draft.colors,
            sizes: draft.sizes,
            purchase_link: draft.purchase_link,
            published_at: Some(published_at),
            status: draft.status.unwrap_or_default(),
            gender: draft.gender.unwrap_or_default(),
        }
    }

    /// `true` while the product is younger than `window`.
    #[must_use]
    pub fn is_new(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.published_at
            .is_some_and(|published| published <= now && now - published <= window)
    }

    /// Discount percentage against `old_price`, when it is higher than `price`.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let old = self.old_price?;
        if old <= self.price || old <= 0.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = (((old - self.price) / old) * 100.0).round() as u32;
        Some(percent)
    }
}

/// Admin form input for a new or fully replaced product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Display name, trimmed on save
    pub name: String,
    /// Current price
    pub price: f64,
    /// Previous price for the discount badge
    #[serde(default)]
    pub old_price: Option<f64>,
    /// Blank or missing falls back to the placeholder image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Grouping label, required
    pub category: String,
    /// Long description
    #[serde(default)]
    pub description: Option<String>,
    /// Color options
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    /// Size options
    #[serde(default)]
    pub sizes: Option<Vec<String>>,
    /// External purchase URL
    #[serde(default)]
    pub purchase_link: Option<String>,
    /// Defaults to active
    #[serde(default)]
    pub status: Option<ProductStatus>,
    /// Defaults to unisex
    #[serde(default)]
    pub gender: Option<Gender>,
}

impl NewProduct {
    /// Checks the fields the admin form enforces.
    ///
    /// # Errors
    /// - [`Error::Validation`] for an empty name or category
    /// - [`Error::InvalidPrice`] for a negative or non-finite price or old price
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation {
                message: "Product name cannot be empty".to_string(),
            });
        }
        if self.category.trim().is_empty() {
            return Err(Error::Validation {
                message: "Product category cannot be empty".to_string(),
            });
        }
        validate_price(self.price)?;
        if let Some(old) = self.old_price {
            validate_price(old)?;
        }
        Ok(())
    }
}

impl From<Product> for NewProduct {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            price: product.price,
            old_price: product.old_price,
            image_url: Some(product.image_url),
            category: product.category,
            description: Some(product.description),
            colors: product.colors,
            sizes: product.sizes,
            purchase_link: product.purchase_link,
            status: Some(product.status),
            gender: Some(product.gender),
        }
    }
}

/// Static storefront category shown in the category strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable slug used in category links
    pub id: String,
    /// Display name, matched against [`Product::category`]
    pub name: String,
    /// Emoji or icon label
    pub icon: String,
    /// Section the category belongs to; `None` shows it everywhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

/// Rejects negative, NaN and infinite amounts.
///
/// # Errors
/// Returns [`Error::InvalidPrice`] carrying the rejected amount.
pub fn validate_price(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidPrice { amount });
    }
    Ok(())
}

/// Splits a comma-separated option field ("P, M, G") into trimmed labels.
#[must_use]
pub fn parse_option_list(raw: &str) -> Option<Vec<String>> {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect();
    if items.is_empty() { None } else { Some(items) }
}

/// Storefront listing filter.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Inclusive lower price bound
    pub min_price: Option<f64>,
    /// Inclusive upper price bound
    pub max_price: Option<f64>,
    /// Empty means every category
    pub categories: HashSet<String>,
    /// `Some(g)` keeps `g` and unisex products
    pub gender: Option<Gender>,
    /// Case-insensitive substring of the name or category; blank matches all
    pub query: Option<String>,
    /// Also keep inactive products (admin views)
    pub include_inactive: bool,
}

impl ProductFilter {
    /// `true` when `product` passes every criterion.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if !self.include_inactive && product.status == ProductStatus::Inactive {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&product.category) {
            return false;
        }
        if self
            .query
            .as_deref()
            .is_some_and(|query| !matches_query(product, query))
        {
            return false;
        }
        match self.gender {
            Some(gender) => product.gender == gender || product.gender == Gender::Unisex,
            None => true,
        }
    }

    /// Keeps matching products, newest first. Undated products sort last.
    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        let mut selected: Vec<Product> = products
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        selected
    }
}

fn matches_query(product: &Product, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    needle.is_empty()
        || product.name.to_lowercase().contains(&needle)
        || product.category.to_lowercase().contains(&needle)
}

/// Search-bar lookup: products whose name or category contains `term`,
/// ignoring case, in list order. A blank term matches nothing.
#[must_use]
pub fn search<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    if term.trim().is_empty() {
        return Vec::new();
    }
    products.iter().filter(|p| matches_query(p, term)).collect()
}

/// Label used for products with a blank category.
pub const UNCATEGORIZED: &str = "Sem categoria";

/// Distinct category labels in use, sorted. Blank categories are reported as
/// [`UNCATEGORIZED`].
#[must_use]
pub fn categories(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .map(|p| {
            let label = p.category.trim();
            if label.is_empty() { UNCATEGORIZED } else { label }
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(ToString::to_string)
        .collect()
}
