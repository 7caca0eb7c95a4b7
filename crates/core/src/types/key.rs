//! Identity keys for cart lines.
//!
//! The guest cart identifies a line by the catalog item it holds; the account
//! cart identifies a line by the server's own line id. [`EntryKey`] carries
//! either one, so a consumer can hand back whatever key it was shown.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::{AlbumId, CartLineId, ProductId};

/// Errors that can occur when parsing an [`EntryKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryKeyError {
    /// The input has no `kind:id` separator.
    #[error("entry key must look like `product:<id>`, `album:<id>` or `line:<id>`")]
    MissingSeparator,
    /// The prefix is not a known kind.
    #[error("unknown entry key kind: {0}")]
    UnknownKind(String),
    /// The id part is not an integer.
    #[error("invalid entry key id: {0}")]
    InvalidId(String),
}

/// Catalog identity of a guest cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Product(ProductId),
    Album(AlbumId),
}

/// Key of a displayed cart entry.
///
/// ## Format
///
/// - `product:<id>` / `album:<id>` - a guest cart line
/// - `line:<id>` - an account cart line
///
/// ```
/// use storecart_core::{CartLineId, EntryKey};
///
/// let key: EntryKey = "line:12".parse().unwrap();
/// assert_eq!(key, EntryKey::Line(CartLineId::new(12)));
/// assert_eq!(key.to_string(), "line:12");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntryKey {
    Item(ItemKey),
    Line(CartLineId),
}

impl From<ItemKey> for EntryKey {
    fn from(key: ItemKey) -> Self {
        Self::Item(key)
    }
}

impl From<CartLineId> for EntryKey {
    fn from(id: CartLineId) -> Self {
        Self::Line(id)
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item(ItemKey::Product(id)) => write!(f, "product:{id}"),
            Self::Item(ItemKey::Album(id)) => write!(f, "album:{id}"),
            Self::Line(id) => write!(f, "line:{id}"),
        }
    }
}

impl FromStr for EntryKey {
    type Err = EntryKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .trim()
            .split_once(':')
            .ok_or(EntryKeyError::MissingSeparator)?;
        let invalid = |_| EntryKeyError::InvalidId(id.to_string());

        match kind {
            "product" => Ok(Self::Item(ItemKey::Product(id.parse().map_err(invalid)?))),
            "album" => Ok(Self::Item(ItemKey::Album(id.parse().map_err(invalid)?))),
            "line" => Ok(Self::Line(id.parse().map_err(invalid)?)),
            other => Err(EntryKeyError::UnknownKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for EntryKey {
    type Error = EntryKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntryKey> for String {
    fn from(key: EntryKey) -> Self {
        key.to_string()
    }
}
