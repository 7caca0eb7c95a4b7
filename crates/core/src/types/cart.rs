//! Cart state shared by both backends.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::line::{LocalLine, RemoteLine};

/// The guest cart, persisted on the device.
pub type GuestCart = CartState<LocalLine>;

/// The account cart, owned by the cart service.
pub type AccountCart = CartState<RemoteLine>;

/// Pricing view of a cart line.
pub trait LineItem {
    /// Price of one unit, after discounts.
    fn unit_price(&self) -> Decimal;

    /// Number of units on the line.
    fn quantity(&self) -> u32;

    /// `unit_price * quantity`, or `None` if it does not fit a `Decimal`.
    fn checked_line_total(&self) -> Option<Decimal> {
        self.unit_price().checked_mul(Decimal::from(self.quantity()))
    }

    /// `unit_price * quantity`, saturating at the `Decimal` bounds.
    fn line_total(&self) -> Decimal {
        self.unit_price()
            .saturating_mul(Decimal::from(self.quantity()))
    }
}

/// An ordered list of cart lines and their grand total.
///
/// `total` always equals the sum of line totals for carts built through
/// [`CartState::try_from_items`]. Remote carts pass the server's total through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState<L> {
    pub items: Vec<L>,
    #[serde(default)]
    pub total: Decimal,
}

impl<L> CartState<L> {
    /// An empty cart with a zero total.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<L: LineItem> CartState<L> {
    /// Build a cart from lines, computing the total.
    ///
    /// A total beyond the `Decimal` range saturates; use
    /// [`CartState::try_from_items`] to reject such carts instead.
    #[must_use]
    pub fn from_items(items: Vec<L>) -> Self {
        let total = items
            .iter()
            .map(LineItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add);
        Self { items, total }
    }

    /// Build a cart from lines, or `None` if any line total or the grand
    /// total overflows.
    #[must_use]
    pub fn try_from_items(items: Vec<L>) -> Option<Self> {
        let total = checked_total(&items)?;
        Some(Self { items, total })
    }

    /// Sum of line totals over the current items, if it fits.
    #[must_use]
    pub fn computed_total(&self) -> Option<Decimal> {
        checked_total(&self.items)
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity())).sum()
    }

    /// Drop zero-quantity lines and recompute the total.
    ///
    /// Returns `None` when the total overflows.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        Self::try_from_items(
            self.items
                .into_iter()
                .filter(|item| item.quantity() > 0)
                .collect(),
        )
    }
}

impl<L> Default for CartState<L> {
    fn default() -> Self {
        Self::empty()
    }
}

fn checked_total<L: LineItem>(items: &[L]) -> Option<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        total.checked_add(item.checked_line_total()?)
    })
}
