//! External warehouse reference mapping
//!
//! The warehouse system does not recognize internal ids; the SKU (products)
//! and order number (orders) are the join keys. A stored external ref means
//! a re-push must update that ref instead of creating a duplicate.

use sqlx::PgPool;

/// Entity kind for product references
pub const KIND_PRODUCT: &str = "PRODUCT";
/// Entity kind for retail order references
pub const KIND_ORDER: &str = "ORDER";

/// Look up the external reference for an entity, if previously pushed
pub async fn find(
    pool: &PgPool,
    kind: &str,
    key: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT external_ref FROM fulfillment_refs
         WHERE entity_kind = $1 AND entity_key = $2",
    )
    .bind(kind)
    .bind(key)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.0))
}

/// Record (or refresh) the external reference returned by the warehouse
pub async fn upsert(
    pool: &PgPool,
    kind: &str,
    key: &str,
    external_ref: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO fulfillment_refs (entity_kind, entity_key, external_ref, updated_at)
         VALUES ($1, $2, $3, now())
         ON CONFLICT (entity_kind, entity_key) DO UPDATE SET
            external_ref = $3, updated_at = now()",
    )
    .bind(kind)
    .bind(key)
    .bind(external_ref)
    .execute(pool)
    .await?;
    Ok(())
}
