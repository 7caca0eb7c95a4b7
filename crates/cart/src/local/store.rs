//! Durable storage for the guest cart.
//!
//! # Layout
//!
//! ```text
//! {storage_dir}/
//!   cart.json        # CartState of LocalLine, written through on every change
//! ```
//!
//! Reads fail soft and writes are best-effort: a missing, unreadable or
//! corrupt record loads as an empty cart, and a failed write is logged and
//! dropped. Neither ever reaches the shopper.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use storecart_core::GuestCart;
use thiserror::Error;
use tracing::{debug, warn};

/// Fixed key the guest cart is stored under.
pub const STORAGE_KEY: &str = "cart";

/// Storage failures. Absorbed inside the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("stored cart is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored cart total is out of range")]
    Overflow,
}

/// Durable home of the guest cart.
pub trait CartStore: Send + Sync {
    /// Read the stored cart. Never fails; a bad record is an empty cart.
    fn load(&self) -> GuestCart;

    /// Persist the cart. Best-effort; failures are swallowed.
    fn save(&self, cart: &GuestCart);
}

/// Decode a stored record, recomputing its total from the lines.
fn decode(raw: &str) -> Result<GuestCart, StoreError> {
    let cart: GuestCart = serde_json::from_str(raw)?;
    cart.normalized().ok_or(StoreError::Overflow)
}

// =============================================================================
// FileStore
// =============================================================================

/// Guest cart stored as a JSON file in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the cart record.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{STORAGE_KEY}.json"))
    }

    /// Storage directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self) -> Result<Option<GuestCart>, StoreError> {
        match fs::read_to_string(self.path()) {
            Ok(raw) => decode(&raw).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a sibling temp file and rename it over the record, so a
    /// crash mid-write keeps the previous cart.
    fn write(&self, cart: &GuestCart) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let body = serde_json::to_vec(cart)?;
        let tmp = self.dir.join(format!("{STORAGE_KEY}.json.tmp"));
        fs::write(&tmp, body)?;
        fs::rename(&tmp, self.path())?;
        Ok(())
    }
}

impl CartStore for FileStore {
    fn load(&self) -> GuestCart {
        match self.read() {
            Ok(Some(cart)) => {
                debug!(lines = cart.items.len(), "Loaded guest cart");
                cart
            }
            Ok(None) => {
                debug!(path = %self.path().display(), "No stored guest cart");
                GuestCart::empty()
            }
            Err(e) => {
                warn!(error = %e, path = %self.path().display(), "Discarding unreadable guest cart");
                GuestCart::empty()
            }
        }
    }

    fn save(&self, cart: &GuestCart) {
        if let Err(e) = self.write(cart) {
            warn!(error = %e, path = %self.path().display(), "Failed to persist guest cart");
        }
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// Guest cart kept in memory as its serialized record.
///
/// For tests and hosts without durable storage. Holds the raw JSON so a
/// corrupt record can be injected.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with a raw record.
    pub fn with_record(raw: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(raw.into())),
        }
    }

    /// The raw stored record, if any.
    #[must_use]
    pub fn record(&self) -> Option<String> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CartStore for MemoryStore {
    fn load(&self) -> GuestCart {
        let Some(raw) = self.record() else {
            return GuestCart::empty();
        };
        decode(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable guest cart");
            GuestCart::empty()
        })
    }

    fn save(&self, cart: &GuestCart) {
        match serde_json::to_string(cart) {
            Ok(raw) => {
                *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw);
            }
            Err(e) => warn!(error = %e, "Failed to persist guest cart"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use storecart_core::{LocalLine, Merchandise, Product, ProductId};
    use tempfile::TempDir;

    use super::*;

    fn tee(quantity: u32) -> GuestCart {
        GuestCart::from_items(vec![LocalLine::new(
            Merchandise::Product(Product {
                id: ProductId::new(1),
                name: "Tee".to_string(),
                price: Decimal::new(1000, 0),
                discount_price: None,
                image: None,
                slug: None,
                variant_id: None,
            }),
            quantity,
        )])
    }

    fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("storage"));
        (store, temp_dir)
    }

    #[test]
    fn test_file_store_roundtrip() {
        let (store, _temp_dir) = create_test_store();
        store.save(&tee(2));

        let loaded = store.load();
        assert_eq!(loaded, tee(2));
        assert_eq!(loaded.total, Decimal::new(2000, 0));
    }

    #[test]
    fn test_missing_record_is_empty() {
        let (store, _temp_dir) = create_test_store();
        assert_eq!(store.load(), GuestCart::empty());
    }

    #[test]
    fn test_invalid_json_is_empty() {
        let (store, _temp_dir) = create_test_store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.path(), "{not json").unwrap();

        assert_eq!(store.load(), GuestCart::empty());
    }

    #[test]
    fn test_stored_total_is_recomputed() {
        let (store, _temp_dir) = create_test_store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(
            store.path(),
            r#"{"items":[{"item_type":"product","id":1,"name":"Tee","price":"1000","quantity":3}],"total":"1"}"#,
        )
        .unwrap();

        assert_eq!(store.load().total, Decimal::new(3000, 0));
    }

    #[test]
    fn test_overflowing_record_is_empty() {
        let (store, _temp_dir) = create_test_store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(
            store.path(),
            r#"{"items":[{"item_type":"product","id":1,"name":"Tee","price":"79228162514264337593543950335","quantity":2}]}"#,
        )
        .unwrap();

        assert_eq!(store.load(), GuestCart::empty());
    }

    #[test]
    fn test_overflowing_sum_in_memory_record_is_empty() {
        let line = r#"{"item_type":"album","id":3,"title":"Blue","price":"79228162514264337593543950335","quantity":1}"#;
        let store = MemoryStore::with_record(format!(r#"{{"items":[{line},{line}]}}"#));

        assert_eq!(store.load(), GuestCart::empty());
    }

    #[test]
    fn test_line_without_quantity_loads_as_one() {
        let (store, _temp_dir) = create_test_store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(
            store.path(),
            r#"{"items":[{"item_type":"product","id":1,"name":"Tee","price":"1000"}]}"#,
        )
        .unwrap();

        let loaded = store.load();
        assert_eq!(loaded, tee(1));
        assert_eq!(loaded.total, Decimal::new(1000, 0));
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let temp_dir = TempDir::new().unwrap();
        // A file where the directory should be makes every write fail.
        let blocker = temp_dir.path().join("blocked");
        fs::write(&blocker, "").unwrap();
        let store = FileStore::new(&blocker);

        store.save(&tee(1));
        assert_eq!(store.load(), GuestCart::empty());
    }

    #[test]
    fn test_memory_store_corrupt_record() {
        let store = MemoryStore::with_record("[]]");
        assert_eq!(store.load(), GuestCart::empty());

        store.save(&tee(1));
        assert!(store.record().unwrap().contains("\"quantity\":1"));
        assert_eq!(store.load(), tee(1));
    }
}
