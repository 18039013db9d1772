//! Money calculation utilities using rust_decimal for precision
//!
//! All order amounts are computed as `Decimal` internally, then
//! converted to `f64` for storage/serialization. The shipping rule
//! lives here so both validation and placement use the same numbers.

use rust_decimal::prelude::*;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::OrderItem;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Orders at or above this subtotal ship free
pub const FREE_SHIPPING_MIN: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Flat fee charged below the free-shipping threshold
pub const FLAT_SHIPPING_FEE: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Maximum allowed price per item
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per item
const MAX_QUANTITY: i32 = 9999;

/// Amounts computed for one order at placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub shipping_fee: f64,
    pub total: f64,
}

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::with_message(
            ErrorCode::InvalidOrderItem,
            format!("{} must be a finite number, got {}", field_name, value),
        ));
    }
    Ok(())
}

/// Validate the item lines of a place-order request
///
/// Every line must name a product and carry a usable price and
/// quantity. An empty list is rejected before any line is looked at.
pub fn validate_order_items(items: &[OrderItem]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }

    for item in items {
        if item.product_id.trim().is_empty() {
            return Err(AppError::with_message(
                ErrorCode::InvalidOrderItem,
                "Order item is missing a product id",
            ));
        }
        if item.name.trim().is_empty() {
            return Err(AppError::with_message(
                ErrorCode::InvalidOrderItem,
                format!("Order item {} is missing a name", item.product_id),
            ));
        }

        require_finite(item.price, "price")?;
        if item.price < 0.0 {
            return Err(AppError::with_message(
                ErrorCode::InvalidOrderItem,
                format!("price must be non-negative, got {}", item.price),
            ));
        }
        if item.price > MAX_PRICE {
            return Err(AppError::with_message(
                ErrorCode::InvalidOrderItem,
                format!(
                    "price exceeds maximum allowed ({}), got {}",
                    MAX_PRICE, item.price
                ),
            ));
        }

        if item.quantity <= 0 {
            return Err(AppError::with_message(
                ErrorCode::InvalidOrderItem,
                format!("quantity must be positive, got {}", item.quantity),
            ));
        }
        if item.quantity > MAX_QUANTITY {
            return Err(AppError::with_message(
                ErrorCode::InvalidOrderItem,
                format!(
                    "quantity exceeds maximum allowed ({}), got {}",
                    MAX_QUANTITY, item.quantity
                ),
            ));
        }
    }

    Ok(())
}

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Line total for one order item
fn line_total(item: &OrderItem) -> Decimal {
    to_decimal(item.price) * Decimal::from(item.quantity)
}

/// Shipping fee for a given subtotal
pub fn shipping_fee(subtotal: Decimal) -> Decimal {
    if subtotal >= FREE_SHIPPING_MIN {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING_FEE
    }
}

/// Compute subtotal, shipping fee and total for a set of order items
///
/// The threshold comparison runs on the unrounded subtotal; rounding
/// happens once on the way out.
pub fn calculate_totals(items: &[OrderItem]) -> OrderTotals {
    let subtotal: Decimal = items.iter().map(line_total).sum();
    let fee = shipping_fee(subtotal);
    let total = subtotal + fee;

    OrderTotals {
        subtotal: to_f64(subtotal),
        shipping_fee: to_f64(fee),
        total: to_f64(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: &str, name: &str, price: f64, quantity: i32) -> OrderItem {
        OrderItem {
            product_id: product_id.to_string(),
            name: name.to_string(),
            price,
            quantity,
            image: String::new(),
        }
    }

    #[test]
    fn test_to_decimal_precision() {
        // Classic floating point problem: 0.1 + 0.2 != 0.3
        let a = 0.1_f64;
        let b = 0.2_f64;
        let sum_f64 = a + b;

        // f64 fails
        assert_ne!(sum_f64, 0.3);

        // Decimal succeeds
        let sum_dec = to_decimal(a) + to_decimal(b);
        assert_eq!(to_f64(sum_dec), 0.3);
    }

    #[test]
    fn test_accumulation_precision() {
        // Sum 0.01 one thousand times
        let mut total = Decimal::ZERO;
        for _ in 0..1000 {
            total += to_decimal(0.01);
        }
        assert_eq!(to_f64(total), 10.0);
    }

    #[test]
    fn test_to_decimal_nan_becomes_zero() {
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
        assert_eq!(to_decimal(f64::INFINITY), Decimal::ZERO);
        assert_eq!(to_decimal(f64::NEG_INFINITY), Decimal::ZERO);
    }

    #[test]
    fn test_shipping_below_threshold() {
        let totals = calculate_totals(&[item("product:p1", "Kettle", 450.0, 2)]);
        assert_eq!(totals.subtotal, 900.0);
        assert_eq!(totals.shipping_fee, 100.0);
        assert_eq!(totals.total, 1000.0);
    }

    #[test]
    fn test_shipping_at_threshold() {
        let totals = calculate_totals(&[item("product:p1", "Kettle", 500.0, 2)]);
        assert_eq!(totals.subtotal, 1000.0);
        assert_eq!(totals.shipping_fee, 0.0);
        assert_eq!(totals.total, 1000.0);
    }

    #[test]
    fn test_shipping_above_threshold() {
        let totals = calculate_totals(&[item("product:p1", "Lamp", 600.0, 2)]);
        assert_eq!(totals.subtotal, 1200.0);
        assert_eq!(totals.shipping_fee, 0.0);
        assert_eq!(totals.total, 1200.0);
    }

    #[test]
    fn test_shipping_just_below_threshold() {
        let totals = calculate_totals(&[item("product:p1", "Lamp", 999.99, 1)]);
        assert_eq!(totals.subtotal, 999.99);
        assert_eq!(totals.shipping_fee, 100.0);
        assert_eq!(totals.total, 1099.99);
    }

    #[test]
    fn test_totals_sum_multiple_lines() {
        let totals = calculate_totals(&[
            item("product:p1", "Kettle", 249.5, 2),
            item("product:p2", "Mug", 99.99, 3),
        ]);
        // 499.00 + 299.97 = 798.97, below the threshold
        assert_eq!(totals.subtotal, 798.97);
        assert_eq!(totals.shipping_fee, 100.0);
        assert_eq!(totals.total, 898.97);
    }

    #[test]
    fn test_totals_rounding_half_up() {
        // 3.335 * 3 = 10.005, rounds to 10.01
        let totals = calculate_totals(&[item("product:p1", "Clip", 3.335, 3)]);
        assert_eq!(totals.subtotal, 10.01);
        assert_eq!(totals.total, 110.01);
    }

    #[test]
    fn test_validate_ok() {
        let items = vec![
            item("product:p1", "Kettle", 450.0, 2),
            item("product:p2", "Mug", 99.99, 1),
        ];
        assert!(validate_order_items(&items).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty() {
        let err = validate_order_items(&[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
    }

    #[test]
    fn test_validate_missing_product_id() {
        let err = validate_order_items(&[item("  ", "Kettle", 450.0, 1)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderItem);
    }

    #[test]
    fn test_validate_missing_name() {
        let err = validate_order_items(&[item("product:p1", "", 450.0, 1)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderItem);
    }

    #[test]
    fn test_validate_nan_price() {
        let err = validate_order_items(&[item("product:p1", "Kettle", f64::NAN, 1)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderItem);
    }

    #[test]
    fn test_validate_negative_price() {
        let err = validate_order_items(&[item("product:p1", "Kettle", -1.0, 1)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderItem);
    }

    #[test]
    fn test_validate_excessive_price() {
        let err =
            validate_order_items(&[item("product:p1", "Kettle", MAX_PRICE + 1.0, 1)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderItem);
    }

    #[test]
    fn test_validate_zero_quantity() {
        let err = validate_order_items(&[item("product:p1", "Kettle", 450.0, 0)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderItem);
    }

    #[test]
    fn test_validate_negative_quantity() {
        let err = validate_order_items(&[item("product:p1", "Kettle", 450.0, -3)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderItem);
    }

    #[test]
    fn test_validate_excessive_quantity() {
        let err = validate_order_items(&[item("product:p1", "Kettle", 1.0, MAX_QUANTITY + 1)])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderItem);
    }

    #[test]
    fn test_validate_stops_at_first_bad_line() {
        let items = vec![
            item("product:p1", "Kettle", 450.0, 1),
            item("product:p2", "", 10.0, 1),
        ];
        let err = validate_order_items(&items).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderItem);
        assert!(err.message.contains("product:p2"));
    }
}
