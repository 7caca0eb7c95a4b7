//! Cart line items.
//!
//! A cart holds one of two line shapes depending on which backend owns it:
//!
//! - [`LocalLine`] - the guest cart keeps a full snapshot of the product or
//!   album that was selected, so prices and display fields survive without
//!   a network round trip. Identity is the catalog id.
//! - [`RemoteLine`] - the account cart stores a thin reference; the server
//!   fills in display fields on fetch. Identity is the server's line id.
//!
//! Both shapes are tagged with `item_type` on the wire.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::LineItem;
use super::id::{AlbumId, CartLineId, ProductId, VariantId};
use super::key::ItemKey;
use super::price::unit_price;

/// Kind of catalog item a cart line refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    Product,
    Album,
}

impl ItemType {
    /// Wire name of the item type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Album => "album",
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Catalog Snapshots
// =============================================================================

/// Product fields captured when a guest adds a product to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Base unit price.
    pub price: Decimal,
    /// Discounted unit price, preferred over `price` when set.
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    /// Primary image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// URL slug.
    #[serde(default)]
    pub slug: Option<String>,
    /// Selected variant, if the product has variants.
    #[serde(default)]
    pub variant_id: Option<VariantId>,
}

/// Album fields captured when a guest adds an album to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    /// Catalog album ID.
    pub id: AlbumId,
    /// Album title.
    pub title: String,
    /// Performing artist.
    #[serde(default)]
    pub artist: Option<String>,
    /// Base unit price.
    pub price: Decimal,
    /// Discounted unit price, preferred over `price` when set.
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    /// Cover art URL.
    #[serde(default)]
    pub cover_image: Option<String>,
}

/// A product or album snapshot, tagged by `item_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "lowercase")]
pub enum Merchandise {
    Product(Product),
    Album(Album),
}

impl Merchandise {
    /// The item type tag.
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        match self {
            Self::Product(_) => ItemType::Product,
            Self::Album(_) => ItemType::Album,
        }
    }

    /// Identity key of the underlying catalog item.
    #[must_use]
    pub const fn key(&self) -> ItemKey {
        match self {
            Self::Product(product) => ItemKey::Product(product.id),
            Self::Album(album) => ItemKey::Album(album.id),
        }
    }

    /// Resolved unit price.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        match self {
            Self::Product(product) => unit_price(product.price, product.discount_price),
            Self::Album(album) => unit_price(album.price, album.discount_price),
        }
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Product(product) => &product.name,
            Self::Album(album) => &album.title,
        }
    }

    /// Display image URL.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        match self {
            Self::Product(product) => product.image.as_deref(),
            Self::Album(album) => album.cover_image.as_deref(),
        }
    }
}

// =============================================================================
// Local Line
// =============================================================================

/// A guest cart line: the full catalog snapshot plus a quantity.
///
/// Serialized flat, e.g. `{"item_type":"album","id":3,"title":"...","price":"500","quantity":1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalLine {
    #[serde(flatten)]
    pub merchandise: Merchandise,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl LocalLine {
    #[must_use]
    pub const fn new(merchandise: Merchandise, quantity: u32) -> Self {
        Self {
            merchandise,
            quantity,
        }
    }

    /// Identity key used to merge repeated adds.
    #[must_use]
    pub const fn key(&self) -> ItemKey {
        self.merchandise.key()
    }
}

impl LineItem for LocalLine {
    fn unit_price(&self) -> Decimal {
        self.merchandise.unit_price()
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }
}

// =============================================================================
// Remote Line
// =============================================================================

/// Reference from a remote cart line to a catalog item.
///
/// The `item_type` tag decides which id is read, so a record can never carry
/// both a product and an album. `variant_id` only exists on products and is
/// serialized as `null` when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "lowercase")]
pub enum ItemRef {
    Product {
        product_id: ProductId,
        #[serde(default)]
        variant_id: Option<VariantId>,
    },
    Album {
        album_id: AlbumId,
    },
}

impl ItemRef {
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        match self {
            Self::Product { .. } => ItemType::Product,
            Self::Album { .. } => ItemType::Album,
        }
    }

    /// Catalog identity of the referenced item (variant ignored).
    #[must_use]
    pub const fn item_key(&self) -> ItemKey {
        match self {
            Self::Product { product_id, .. } => ItemKey::Product(*product_id),
            Self::Album { album_id } => ItemKey::Album(*album_id),
        }
    }
}

const fn default_quantity() -> u32 {
    1
}

/// An account cart line as returned by the cart service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLine {
    /// Server-assigned line ID.
    pub id: CartLineId,
    #[serde(flatten)]
    pub reference: ItemRef,
    /// Missing quantities count as one unit.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Product display fields, populated server-side.
    #[serde(default)]
    pub product: Option<Product>,
    /// Album display fields, populated server-side.
    #[serde(default)]
    pub album: Option<Album>,
    /// Line-level unit price override.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Line-level discounted unit price.
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    /// When the line was added.
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}

impl RemoteLine {
    /// Display title from the populated product or album, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self.reference {
            ItemRef::Product { .. } => self.product.as_ref().map(|p| p.name.as_str()),
            ItemRef::Album { .. } => self.album.as_ref().map(|a| a.title.as_str()),
        }
    }

    /// Display image from the populated product or album, if any.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        match self.reference {
            ItemRef::Product { .. } => self.product.as_ref().and_then(|p| p.image.as_deref()),
            ItemRef::Album { .. } => self.album.as_ref().and_then(|a| a.cover_image.as_deref()),
        }
    }
}

impl LineItem for RemoteLine {
    fn unit_price(&self) -> Decimal {
        if let Some(price) = self.price {
            return unit_price(price, self.discount_price);
        }
        match self.reference {
            ItemRef::Product { .. } => self
                .product
                .as_ref()
                .map_or(Decimal::ZERO, |p| unit_price(p.price, p.discount_price)),
            ItemRef::Album { .. } => self
                .album
                .as_ref()
                .map_or(Decimal::ZERO, |a| unit_price(a.price, a.discount_price)),
        }
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }
}
