//! Guest cart backend.
//!
//! Holds the guest cart in memory, applies the pure mutations from
//! [`algebra`] and writes every new state through to a [`CartStore`].
//! Mutations are applied under a lock, so two rapid calls both land.

pub mod algebra;
pub mod store;

use std::sync::{Arc, Mutex, PoisonError};

use storecart_core::GuestCart;
use tracing::debug;

pub use algebra::{add_local, clear_local, remove_local, update_local};
pub use store::{CartStore, FileStore, MemoryStore, STORAGE_KEY, StoreError};

/// The in-memory guest cart and its durable store.
pub struct LocalBackend {
    store: Arc<dyn CartStore>,
    cart: Mutex<GuestCart>,
}

impl LocalBackend {
    /// Load the stored guest cart.
    pub fn open(store: Arc<dyn CartStore>) -> Self {
        let cart = store.load();
        debug!(lines = cart.items.len(), total = %cart.total, "Guest cart opened");
        Self {
            store,
            cart: Mutex::new(cart),
        }
    }

    /// Current guest cart.
    #[must_use]
    pub fn cart(&self) -> GuestCart {
        self.observe(GuestCart::clone)
    }

    /// Run `f` against the current guest cart while holding the lock.
    ///
    /// Nothing else can mutate the cart until `f` returns, so anything
    /// derived here is ordered with respect to mutations.
    pub fn observe<R>(&self, f: impl FnOnce(&GuestCart) -> R) -> R {
        f(&self.cart.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Apply a mutation, persist the result and return it.
    ///
    /// The store write happens under the same lock, so records land in
    /// mutation order.
    pub fn apply(&self, mutation: impl FnOnce(&GuestCart) -> GuestCart) -> GuestCart {
        let mut cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        let next = mutation(&cart);
        self.store.save(&next);
        *cart = next.clone();
        next
    }
}

impl std::fmt::Debug for LocalBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBackend")
            .field("cart", &self.cart())
            .finish_non_exhaustive()
    }
}
