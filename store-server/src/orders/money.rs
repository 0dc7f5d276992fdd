//! Money helpers using rust_decimal for precision
//!
//! All monetary amounts are `Decimal` end to end; rounding happens once per
//! computed value, never through floating point.

use rust_decimal::prelude::*;

use shared::error::{AppError, ErrorCode};

/// Rounding strategy for monetary values (2 decimal places, half-up)
pub const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed price per item
const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Maximum allowed quantity per item
const MAX_QUANTITY: i32 = 9999;

/// Round a monetary value to 2 decimal places, half away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a major-unit amount to gateway minor units (e.g. rupees to paise)
pub fn to_minor_units(value: Decimal) -> Option<i64> {
    (round_money(value) * Decimal::ONE_HUNDRED).trunc().to_i64()
}

/// Order total identity: `subtotal + tax + shipping - discount`, clamped to
/// zero so an oversized discount never yields a negative total.
pub fn compute_total(
    subtotal: Decimal,
    tax: Decimal,
    shipping: Decimal,
    discount: Decimal,
) -> Decimal {
    round_money((subtotal + tax + shipping - discount).max(Decimal::ZERO))
}

/// Validate a catalog price before freezing it into an order item
pub fn validate_price(price: Decimal) -> Result<(), AppError> {
    if price < Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::ProductInvalidPrice,
            format!("price must be non-negative, got {price}"),
        ));
    }
    if price > MAX_PRICE {
        return Err(AppError::with_message(
            ErrorCode::ProductInvalidPrice,
            format!("price exceeds maximum allowed ({MAX_PRICE}), got {price}"),
        ));
    }
    Ok(())
}

/// Validate a requested quantity
pub fn validate_quantity(quantity: i32) -> Result<(), AppError> {
    if quantity <= 0 {
        return Err(AppError::validation(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::validation(format!(
            "quantity exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"
        )));
    }
    Ok(())
}
