//! Pricing & inventory snapshot
//!
//! Resolves requested line items against the catalog and freezes price,
//! name, and a full product snapshot into the order items, so later catalog
//! edits or deletions never corrupt historical order records or receipts.
//! Tax and shipping are not computed here; they are managed post-order.

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use shared::error::{AppError, ErrorCode};
use shared::models::OrderItemInput;

use super::money;
use crate::db::catalog::Product;
use crate::db::orders::NewOrderItem;

/// Frozen line items plus their exact decimal subtotal
#[derive(Debug)]
pub struct Snapshot {
    pub items: Vec<NewOrderItem>,
    pub subtotal: Decimal,
}

/// Freeze the requested items against the resolved catalog products.
///
/// Fails with `ProductNotFound` when an id does not resolve to an active
/// product and with a validation error for non-positive quantities. Item
/// totals are computed once here and never recomputed from live catalog
/// data.
pub fn snapshot_items(
    catalog: &HashMap<Uuid, Product>,
    requested: &[OrderItemInput],
) -> Result<Snapshot, AppError> {
    if requested.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }

    let mut items = Vec::with_capacity(requested.len());
    let mut subtotal = Decimal::ZERO;

    for req in requested {
        money::validate_quantity(req.quantity)?;

        let product = catalog
            .get(&req.product_id)
            .filter(|p| p.is_active)
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ProductNotFound,
                    format!("Product {} not found", req.product_id),
                )
            })?;

        money::validate_price(product.price)?;

        let price = money::round_money(product.price);
        let total = money::round_money(price * Decimal::from(req.quantity));
        subtotal += total;

        let product_snapshot = serde_json::to_value(product)
            .map_err(|e| AppError::internal(format!("product snapshot failed: {e}")))?;

        items.push(NewOrderItem {
            product_id: product.id,
            name: product.name.clone(),
            price,
            quantity: req.quantity,
            total,
            product_snapshot,
        });
    }

    Ok(Snapshot {
        items,
        subtotal: money::round_money(subtotal),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: Uuid, name: &str, price: &str) -> Product {
        Product {
            id,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            price: price.parse().unwrap(),
            category: "apparel".to_string(),
            image: Some("/img/p.webp".to_string()),
            sku: None,
            brand: None,
            weight_grams: None,
            length_cm: None,
            width_cm: None,
            height_cm: None,
            is_active: true,
        }
    }

    fn catalog_of(products: Vec<Product>) -> HashMap<Uuid, Product> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    #[test]
    fn test_subtotal_two_items() {
        // qty 2 @ 100 + qty 1 @ 50 -> subtotal 250
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let catalog = catalog_of(vec![product(a, "Kurta", "100"), product(b, "Scarf", "50")]);

        let snap = snapshot_items(
            &catalog,
            &[
                OrderItemInput {
                    product_id: a,
                    quantity: 2,
                },
                OrderItemInput {
                    product_id: b,
                    quantity: 1,
                },
            ],
        )
        .unwrap();

        assert_eq!(snap.subtotal, Decimal::from(250));
        assert_eq!(snap.items.len(), 2);
        assert_eq!(snap.items[0].total, Decimal::from(200));
        assert_eq!(snap.items[1].total, Decimal::from(50));
    }

    #[test]
    fn test_subtotal_decimal_exact() {
        // 3 x 19.99 must be exactly 59.97, no float drift
        let a = Uuid::new_v4();
        let catalog = catalog_of(vec![product(a, "Mug", "19.99")]);

        let snap = snapshot_items(
            &catalog,
            &[OrderItemInput {
                product_id: a,
                quantity: 3,
            }],
        )
        .unwrap();

        assert_eq!(snap.subtotal.to_string(), "59.97");
    }

    #[test]
    fn test_unknown_product_rejected() {
        let catalog = catalog_of(vec![]);
        let err = snapshot_items(
            &catalog,
            &[OrderItemInput {
                product_id: Uuid::new_v4(),
                quantity: 1,
            }],
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
    }

    #[test]
    fn test_inactive_product_rejected() {
        let a = Uuid::new_v4();
        let mut p = product(a, "Old Kurta", "100");
        p.is_active = false;
        let catalog = catalog_of(vec![p]);

        let err = snapshot_items(
            &catalog,
            &[OrderItemInput {
                product_id: a,
                quantity: 1,
            }],
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let a = Uuid::new_v4();
        let catalog = catalog_of(vec![product(a, "Kurta", "100")]);

        let err = snapshot_items(
            &catalog,
            &[OrderItemInput {
                product_id: a,
                quantity: 0,
            }],
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_empty_request_rejected() {
        let catalog = catalog_of(vec![]);
        let err = snapshot_items(&catalog, &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
    }

    #[test]
    fn test_snapshot_freezes_product_record() {
        let a = Uuid::new_v4();
        let catalog = catalog_of(vec![product(a, "Kurta", "100")]);

        let snap = snapshot_items(
            &catalog,
            &[OrderItemInput {
                product_id: a,
                quantity: 1,
            }],
        )
        .unwrap();

        let frozen = &snap.items[0].product_snapshot;
        assert_eq!(frozen["name"], "Kurta");
        assert_eq!(frozen["slug"], "kurta");
        assert_eq!(frozen["category"], "apparel");
    }
}
