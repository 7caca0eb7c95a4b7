//! Pure mutations of the guest cart.
//!
//! Every function takes the current cart and returns the next one with its
//! total recomputed. None of them can fail: a key that matches no line makes
//! update and remove a no-op, and add appends.

use storecart_core::{GuestCart, ItemKey, LocalLine, Merchandise};

/// Add `quantity` units of `merchandise`.
///
/// An existing line with the same identity key keeps its snapshot and gains
/// `quantity` units; otherwise a new line is appended. Adding zero units
/// changes nothing.
#[must_use]
pub fn add_local(state: &GuestCart, merchandise: Merchandise, quantity: u32) -> GuestCart {
    if quantity == 0 {
        return state.clone();
    }

    let key = merchandise.key();
    let mut items = state.items.clone();

    match items.iter_mut().find(|line| line.key() == key) {
        Some(line) => line.quantity = line.quantity.saturating_add(quantity),
        None => items.push(LocalLine::new(merchandise, quantity)),
    }

    GuestCart::from_items(items)
}

/// Set the quantity of the line keyed by `key`.
///
/// Zero or negative quantities remove the line.
#[must_use]
pub fn update_local(state: &GuestCart, key: ItemKey, quantity: i64) -> GuestCart {
    if quantity <= 0 {
        return remove_local(state, key);
    }

    let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
    let items = state
        .items
        .iter()
        .map(|line| {
            if line.key() == key {
                LocalLine {
                    quantity,
                    ..line.clone()
                }
            } else {
                line.clone()
            }
        })
        .collect();

    GuestCart::from_items(items)
}

/// Drop the line keyed by `key`.
#[must_use]
pub fn remove_local(state: &GuestCart, key: ItemKey) -> GuestCart {
    GuestCart::from_items(
        state
            .items
            .iter()
            .filter(|line| line.key() != key)
            .cloned()
            .collect(),
    )
}

/// Empty the cart.
#[must_use]
pub const fn clear_local(_state: &GuestCart) -> GuestCart {
    GuestCart::empty()
}
