//! Read-only catalog mirror
//!
//! The product catalog is owned by the storefront CMS; this service only
//! reads it for the pricing snapshot and the fulfillment sync.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Catalog product row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub category: String,
    pub image: Option<String>,
    pub sku: Option<String>,
    pub brand: Option<String>,
    pub weight_grams: Option<i32>,
    pub length_cm: Option<i32>,
    pub width_cm: Option<i32>,
    pub height_cm: Option<i32>,
    pub is_active: bool,
}

const PRODUCT_COLUMNS: &str = "id, name, slug, price, category, image, sku, brand, \
     weight_grams, length_cm, width_cm, height_cm, is_active";

/// Find a single product by id
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Find all products matching the given ids (missing ids are simply absent)
pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
}

/// List all active products (fulfillment bulk sync)
pub async fn list_active(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = TRUE ORDER BY name"
    ))
    .fetch_all(pool)
    .await
}
