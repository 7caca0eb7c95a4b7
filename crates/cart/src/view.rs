//! Read-only projection of the active cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storecart_core::{AccountCart, EntryKey, GuestCart, ItemType};

use crate::normalize::{entry_from_local, entry_from_remote};

/// One displayed cart line, whichever backend it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Key to pass back to the facade for update/remove.
    pub key: EntryKey,
    pub item_type: ItemType,
    pub title: String,
    pub image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// What consumers render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartEntry>,
    /// Total units across all lines.
    pub count: u64,
    pub total: Decimal,
    /// True only while an account cart fetch is outstanding.
    pub is_loading: bool,
}

impl CartView {
    /// Empty, idle view.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            total: Decimal::ZERO,
            is_loading: false,
        }
    }

    /// Project the guest cart. Guests never load.
    #[must_use]
    pub fn from_guest(cart: &GuestCart) -> Self {
        Self {
            items: cart.items.iter().map(entry_from_local).collect(),
            count: cart.item_count(),
            total: cart.total,
            is_loading: false,
        }
    }

    /// Project the account cart; `None` (not fetched yet) is an empty cart.
    #[must_use]
    pub fn from_account(cart: Option<&AccountCart>, is_loading: bool) -> Self {
        cart.map_or_else(
            || Self {
                is_loading,
                ..Self::empty()
            },
            |cart| Self {
                items: cart.items.iter().map(entry_from_remote).collect(),
                count: cart.item_count(),
                total: cart.total,
                is_loading,
            },
        )
    }

    /// The same view with a different loading flag.
    #[must_use]
    pub fn loading(self, is_loading: bool) -> Self {
        Self { is_loading, ..self }
    }
}

impl Default for CartView {
    fn default() -> Self {
        Self::empty()
    }
}
