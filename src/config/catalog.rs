//! Baseline catalog loading from config.toml
//!
//! Each `[[products]]` table becomes one seed record. Seed ids are written
//! explicitly in the file so reconciliation can recognize them on every run.

use crate::core::catalog::Catalog;
use crate::errors::{Error, Result};
use crate::models::{NewProduct, Product};
use serde::Deserialize;

/// One `[[products]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    /// Stable seed id
    pub id: String,
    /// Product fields, same keys as the admin form
    #[serde(flatten)]
    pub fields: NewProduct,
}

impl CatalogEntry {
    /// Validates the entry and turns it into an undated seed product.
    ///
    /// # Errors
    /// Returns the validation error for the offending field.
    pub fn into_product(self) -> Result<Product> {
        if self.id.trim().is_empty() {
            return Err(Error::Config {
                message: format!("Catalog product '{}' has an empty id", self.fields.name),
            });
        }
        self.fields.validate().map_err(|e| Error::Config {
            message: format!("Catalog product '{}' is invalid: {e}", self.id),
        })?;
        let mut product = Product::from_draft(self.id, self.fields, chrono::Utc::now());
        product.published_at = None;
        Ok(product)
    }
}

/// Builds a [`Catalog`] from parsed entries.
///
/// # Errors
/// Returns [`Error::Config`] for the first invalid entry.
pub fn build_catalog(entries: Vec<CatalogEntry>) -> Result<Catalog> {
    let products = entries
        .into_iter()
        .map(CatalogEntry::into_product)
        .collect::<Result<Vec<_>>>()?;
    Ok(Catalog::new(products))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::models::{Gender, PLACEHOLDER_IMAGE_URL};

    #[derive(Deserialize)]
    struct Wrapper {
        products: Vec<CatalogEntry>,
    }

    #[test]
    fn test_parse_catalog_entries() {
        let toml_str = r#"
            [[products]]
            id = "seed-camiseta"
            name = "Camiseta Básica"
            price = 49.9
            category = "Camisetas"
            colors = ["Preto", "Branco"]

            [[products]]
            id = "seed-calca"
            name = "Calça Jeans"
            price = 129.9
            old_price = 159.9
            category = "Calças"
            gender = "female"
        "#;

        let wrapper: Wrapper = toml::from_str(toml_str).unwrap();
        let catalog = build_catalog(wrapper.products).unwrap();
        assert_eq!(catalog.len(), 2);

        let shirt = &catalog.products()[0];
        assert_eq!(shirt.id, "seed-camiseta");
        assert_eq!(shirt.image_url, PLACEHOLDER_IMAGE_URL);
        assert_eq!(shirt.colors.as_ref().unwrap().len(), 2);
        assert!(shirt.published_at.is_none());

        let jeans = &catalog.products()[1];
        assert_eq!(jeans.old_price, Some(159.9));
        assert_eq!(jeans.gender, Gender::Female);
    }

    #[test]
    fn test_invalid_entry_is_config_error() {
        let toml_str = r#"
            [[products]]
            id = "seed-bad"
            name = "Bad"
            price = -5.0
            category = "X"
        "#;
        let wrapper: Wrapper = toml::from_str(toml_str).unwrap();
        let err = build_catalog(wrapper.products).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
