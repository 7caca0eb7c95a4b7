//! Core types for storecart.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod key;
pub mod line;
pub mod price;

pub use cart::{AccountCart, CartState, GuestCart, LineItem};
pub use id::*;
pub use key::{EntryKey, EntryKeyError, ItemKey};
pub use line::{Album, ItemRef, ItemType, LocalLine, Merchandise, Product, RemoteLine};
pub use price::unit_price;
