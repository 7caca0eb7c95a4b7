//! Unit price resolution using decimal arithmetic.
//!
//! Catalog records carry a base `price` and an optional `discount_price`.
//! Every total in the cart is computed from the resolved unit price, so the
//! rule lives in one place.

use rust_decimal::Decimal;

/// Resolve the unit price charged for one unit of an item.
///
/// A discount price wins over the base price when it is present and
/// positive. A zero or negative discount is treated as "no discount".
///
/// ```rust
/// use rust_decimal::Decimal;
/// use storecart_core::unit_price;
///
/// assert_eq!(unit_price(Decimal::new(1000, 0), None), Decimal::new(1000, 0));
/// assert_eq!(
///     unit_price(Decimal::new(1000, 0), Some(Decimal::new(800, 0))),
///     Decimal::new(800, 0)
/// );
/// ```
#[must_use]
pub fn unit_price(price: Decimal, discount_price: Option<Decimal>) -> Decimal {
    match discount_price {
        Some(discounted) if discounted > Decimal::ZERO => discounted,
        _ => price,
    }
}
