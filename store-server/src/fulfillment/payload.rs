//! Warehouse payload translation
//!
//! The warehouse API has its own required-field schema (brand, category,
//! SKU, weight/dimensions, tax rule name) with string-typed numerics that
//! does not map one-to-one onto the internal model. This layer derives the
//! missing physical attributes from heuristics and keeps the quirks from
//! leaking into the order core. It never fails on missing optional fields.

use serde::Serialize;

use shared::models::{Address, PaymentMethod};

use crate::db::catalog::Product;
use crate::db::orders::{Order, OrderItem};

/// House brand used when the catalog carries none
const DEFAULT_BRAND: &str = "STOREFRONT";
/// Parcel weight assumed when the catalog carries none (grams)
const DEFAULT_WEIGHT_GRAMS: i32 = 500;
/// Parcel edge assumed when the catalog carries no dimensions (cm)
const DEFAULT_DIMENSION_CM: i32 = 10;

/// Product definition in the warehouse's schema
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WarehouseProduct {
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    /// String-typed by the warehouse API
    pub mrp: String,
    pub selling_price: String,
    pub weight_grams: i32,
    pub length_cm: i32,
    pub width_cm: i32,
    pub height_cm: i32,
    pub tax_rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// SKU join key between internal and external systems: the catalog SKU when
/// present, otherwise derived from the product id.
pub fn sku_for(product: &Product) -> String {
    product
        .sku
        .clone()
        .unwrap_or_else(|| format!("PRD-{}", product.id.simple()))
}

/// Tax rule name expected by the warehouse, derived from the category
pub fn tax_rule_for(category: &str) -> String {
    match category.to_ascii_lowercase().as_str() {
        "books" => "GST_0",
        "groceries" | "food" => "GST_5",
        "apparel" | "clothing" | "footwear" => "GST_12",
        _ => "GST_18",
    }
    .to_string()
}

/// Translate a catalog product into the warehouse schema
pub fn product_payload(product: &Product) -> WarehouseProduct {
    WarehouseProduct {
        sku: sku_for(product),
        name: product.name.clone(),
        brand: product
            .brand
            .clone()
            .unwrap_or_else(|| DEFAULT_BRAND.to_string()),
        category: product.category.clone(),
        mrp: product.price.to_string(),
        selling_price: product.price.to_string(),
        weight_grams: product.weight_grams.unwrap_or(DEFAULT_WEIGHT_GRAMS),
        length_cm: product.length_cm.unwrap_or(DEFAULT_DIMENSION_CM),
        width_cm: product.width_cm.unwrap_or(DEFAULT_DIMENSION_CM),
        height_cm: product.height_cm.unwrap_or(DEFAULT_DIMENSION_CM),
        tax_rule: tax_rule_for(&product.category),
        image_url: product.image.clone(),
    }
}

/// One line of a retail order in the warehouse schema
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WarehouseOrderItem {
    pub sku: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price: String,
}

/// Shipping block in the warehouse schema
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WarehouseShipping {
    pub name: String,
    pub address1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Retail order in the warehouse schema
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WarehouseOrder {
    /// The order number is the external join key
    pub order_ref: String,
    pub order_date: String,
    pub payment_mode: String,
    pub total: String,
    pub items: Vec<WarehouseOrderItem>,
    pub shipping: WarehouseShipping,
}

/// Translate an internal order + items into the warehouse schema
pub fn order_payload(order: &Order, items: &[OrderItem]) -> WarehouseOrder {
    WarehouseOrder {
        order_ref: order.order_number.clone(),
        order_date: order.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        payment_mode: match order.payment_method {
            PaymentMethod::Gateway => "PREPAID",
            PaymentMethod::CashOnDelivery => "COD",
        }
        .to_string(),
        total: order.total.to_string(),
        items: items
            .iter()
            .map(|item| WarehouseOrderItem {
                sku: item_sku(item),
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.price.to_string(),
            })
            .collect(),
        shipping: shipping_block(&order.shipping_address.0),
    }
}

/// SKU for an order line: taken from the frozen product snapshot when
/// present, otherwise derived from the product id.
fn item_sku(item: &OrderItem) -> String {
    item.product_snapshot
        .get("sku")
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_else(|| format!("PRD-{}", item.product_id.simple()))
}

fn shipping_block(address: &Address) -> WarehouseShipping {
    WarehouseShipping {
        name: address.name.clone(),
        address1: address.line1.clone(),
        address2: address.line2.clone(),
        city: address.city.clone(),
        state: address.state.clone(),
        pincode: address.postal_code.clone(),
        country: address.country.clone(),
        phone: address.phone.clone(),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::orders::state_machine::test_support::sample_order;

    fn bare_product() -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Cotton Kurta".to_string(),
            slug: "cotton-kurta".to_string(),
            price: Decimal::new(19900, 2),
            category: "apparel".to_string(),
            image: None,
            sku: None,
            brand: None,
            weight_grams: None,
            length_cm: None,
            width_cm: None,
            height_cm: None,
            is_active: true,
        }
    }

    #[test]
    fn test_product_payload_applies_defaults() {
        let product = bare_product();
        let payload = product_payload(&product);

        assert!(payload.sku.starts_with("PRD-"));
        assert_eq!(payload.brand, "STOREFRONT");
        assert_eq!(payload.weight_grams, 500);
        assert_eq!(payload.length_cm, 10);
        assert_eq!(payload.width_cm, 10);
        assert_eq!(payload.height_cm, 10);
    }

    #[test]
    fn test_product_payload_keeps_catalog_values() {
        let mut product = bare_product();
        product.sku = Some("KUR-001".to_string());
        product.brand = Some("Handloom Co".to_string());
        product.weight_grams = Some(320);

        let payload = product_payload(&product);
        assert_eq!(payload.sku, "KUR-001");
        assert_eq!(payload.brand, "Handloom Co");
        assert_eq!(payload.weight_grams, 320);
    }

    #[test]
    fn test_prices_are_string_typed() {
        let payload = product_payload(&bare_product());
        assert_eq!(payload.mrp, "199.00");
        assert_eq!(payload.selling_price, "199.00");
    }

    #[test]
    fn test_tax_rule_mapping() {
        assert_eq!(tax_rule_for("books"), "GST_0");
        assert_eq!(tax_rule_for("Groceries"), "GST_5");
        assert_eq!(tax_rule_for("APPAREL"), "GST_12");
        assert_eq!(tax_rule_for("electronics"), "GST_18");
    }

    #[test]
    fn test_order_payload_maps_payment_mode_and_address() {
        let mut order = sample_order();
        order.payment_method = shared::models::PaymentMethod::CashOnDelivery;

        let payload = order_payload(&order, &[]);
        assert_eq!(payload.payment_mode, "COD");
        assert_eq!(payload.order_ref, order.order_number);
        assert_eq!(payload.total, "250");
        assert_eq!(payload.shipping.pincode, "560001");
        assert_eq!(payload.shipping.city, "Bengaluru");
    }

    #[test]
    fn test_item_sku_from_snapshot_with_fallback() {
        let order = sample_order();
        let with_sku = OrderItem {
            id: Uuid::new_v4(),
            order_id: order.id,
            product_id: Uuid::new_v4(),
            name: "Cotton Kurta".to_string(),
            price: Decimal::new(19900, 2),
            quantity: 2,
            total: Decimal::new(39800, 2),
            product_snapshot: serde_json::json!({"sku": "KUR-001"}),
        };
        let without_sku = OrderItem {
            product_snapshot: serde_json::json!({"sku": null}),
            ..with_sku.clone()
        };

        let payload = order_payload(&order, &[with_sku, without_sku]);
        assert_eq!(payload.items[0].sku, "KUR-001");
        assert!(payload.items[1].sku.starts_with("PRD-"));
        assert_eq!(payload.items[0].unit_price, "199.00");
    }
}
