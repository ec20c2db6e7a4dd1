//! Baseline catalog: the static products bundled with the storefront.
//!
//! The baseline seeds an empty local store and tops it up during
//! reconciliation. Its records carry fixed ids so that reconciliation can
//! recognize them across runs.

use crate::models::{Category, Gender, Product, ProductStatus};
use std::collections::HashSet;
use tracing::warn;

/// Ordered, id-unique list of seed products.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Builds a catalog, keeping the first record for any repeated id.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(products.len());
        for product in products {
            if seen.insert(product.id.clone()) {
                unique.push(product);
            } else {
                warn!("Ignoring duplicate catalog id '{}'", product.id);
            }
        }
        Self { products: unique }
    }

    /// Seed products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of seed products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// `true` when the catalog seeds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// The catalog shipped with the storefront when no config overrides it.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            seed(
                "seed-camiseta-basica",
                "Camiseta Básica",
                49.90,
                None,
                "Camisetas",
                "Camiseta básica de algodão de alta qualidade",
                &["Preto", "Branco", "Cinza"],
                &["P", "M", "G", "GG"],
                Gender::Unisex,
            ),
            seed(
                "seed-calca-jeans-skinny",
                "Calça Jeans Skinny",
                129.90,
                Some(159.90),
                "Calças",
                "Calça jeans skinny de alta elasticidade",
                &["Azul Escuro", "Azul Claro", "Preto"],
                &["36", "38", "40", "42", "44"],
                Gender::Female,
            ),
            seed(
                "seed-tenis-casual",
                "Tênis Casual",
                199.90,
                None,
                "Calçados",
                "Tênis casual confortável para o dia a dia",
                &["Preto", "Branco", "Cinza"],
                &["39", "40", "41", "42", "43"],
                Gender::Male,
            ),
            seed(
                "seed-vestido-floral",
                "Vestido Floral",
                89.90,
                None,
                "Vestidos",
                "Vestido floral de verão, leve e confortável",
                &["Estampa Floral", "Azul", "Rosa"],
                &["P", "M", "G"],
                Gender::Female,
            ),
            seed(
                "seed-camisa-social",
                "Camisa Social",
                119.90,
                None,
                "Camisas",
                "Camisa social slim fit para ocasiões formais",
                &["Branco", "Azul Claro", "Rosa Claro"],
                &["P", "M", "G", "GG"],
                Gender::Male,
            ),
        ])
    }
}

/// The static category strip. Names match the categories used by the
/// built-in products.
#[must_use]
pub fn builtin_categories() -> Vec<Category> {
    [
        ("camisetas", "Camisetas", "👕", None),
        ("camisas", "Camisas", "👔", Some(Gender::Male)),
        ("calcas", "Calças", "👖", None),
        ("vestidos", "Vestidos", "👗", Some(Gender::Female)),
        ("saias", "Saias", "👚", Some(Gender::Female)),
        ("calcados", "Calçados", "👟", None),
        ("bolsas", "Bolsas", "👜", Some(Gender::Female)),
        ("acessorios", "Acessórios", "🧢", Some(Gender::Male)),
    ]
    .into_iter()
    .map(|(id, name, icon, gender)| Category {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        gender,
    })
    .collect()
}

/// Categories for one storefront section.
///
/// `None` returns every category. `Some(g)` keeps categories tagged `g` or
/// untagged, mirroring how unisex products appear in both sections.
#[must_use]
pub fn categories_for(categories: &[Category], gender: Option<Gender>) -> Vec<&Category> {
    categories
        .iter()
        .filter(|c| match (gender, c.gender) {
            (None, _) | (Some(_), None) => true,
            (Some(wanted), Some(tagged)) => wanted == tagged || tagged == Gender::Unisex,
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn seed(
    id: &str,
    name: &str,
    price: f64,
    old_price: Option<f64>,
    category: &str,
    description: &str,
    colors: &[&str],
    sizes: &[&str],
    gender: Gender,
) -> Product {
    let slug = id.trim_start_matches("seed-");
    Product {
        id: id.to_string(),
        name: name.to_string(),
        price,
        old_price,
        image_url: format!("https://via.placeholder.com/300x300?text={slug}"),
        category: category.to_string(),
        description: description.to_string(),
        colors: Some(colors.iter().map(ToString::to_string).collect()),
        sizes: Some(sizes.iter().map(ToString::to_string).collect()),
        purchase_link: Some(format!("https://example.com/{slug}")),
        published_at: None,
        status: ProductStatus::Active,
        gender,
    }
}
