//! Entity module - `SeaORM` entity definitions for the remote product service.
//! Each entity has a Model struct for row data and an Entity struct for queries.

/// `products` table
pub mod product;

pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
