//! Cache for the account cart.
//!
//! One fixed key, one entry. Mutations never write the entry; they only
//! invalidate it, and the next read refetches. The last successfully
//! fetched cart is kept separately so consumers keep seeing it while a
//! refetch is in flight.
//!
//! Every [`CartCache::reset`] starts a new epoch. A fetch records the epoch
//! it started in and its result is only stored if no reset happened in the
//! meantime, so a cart fetched for one session never outlives the switch to
//! the next.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use moka::future::Cache;
use storecart_core::AccountCart;
use tracing::debug;

/// Cache key for the account cart.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Cart,
}

/// Read cache plus last known-good value for the account cart.
pub struct CartCache {
    entries: Cache<CacheKey, AccountCart>,
    last_known: RwLock<Option<AccountCart>>,
    epoch: AtomicU64,
}

impl CartCache {
    /// Create a cache whose entry expires after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder().time_to_live(ttl).build(),
            last_known: RwLock::new(None),
            epoch: AtomicU64::new(0),
        }
    }

    /// Current epoch. Capture it before fetching and pass it to
    /// [`CartCache::store`].
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Fresh cached cart, if the entry is present.
    pub async fn read(&self) -> Option<AccountCart> {
        let cart = self.entries.get(&CacheKey::Cart).await;
        if cart.is_some() {
            debug!("Cache hit for account cart");
        }
        cart
    }

    /// Store a cart fetched during `epoch`.
    ///
    /// Returns `false` and stores nothing if the cache was reset since.
    pub async fn store(&self, epoch: u64, cart: AccountCart) -> bool {
        {
            let mut last_known = self
                .last_known
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if self.epoch() != epoch {
                debug!(epoch, "Discarding account cart fetched before reset");
                return false;
            }
            *last_known = Some(cart.clone());
        }

        self.entries.insert(CacheKey::Cart, cart).await;

        // A reset may have run between the two writes.
        if self.epoch() != epoch {
            self.entries.invalidate(&CacheKey::Cart).await;
            return false;
        }
        true
    }

    /// Mark the cached cart stale. The last known value is kept.
    pub async fn invalidate(&self) {
        debug!("Invalidating account cart cache");
        self.entries.invalidate(&CacheKey::Cart).await;
    }

    /// Drop everything, including the last known value, and start a new
    /// epoch so in-flight fetches cannot store their result.
    ///
    /// Used when the session changes hands.
    pub async fn reset(&self) {
        {
            let mut last_known = self
                .last_known
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *last_known = None;
        }
        self.invalidate().await;
    }

    /// Last successfully fetched cart, fresh or stale.
    #[must_use]
    pub fn last_known(&self) -> Option<AccountCart> {
        self.last_known
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
