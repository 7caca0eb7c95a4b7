//! Shape conversions between consumers and the two backends.
//!
//! One function per direction:
//!
//! - [`to_remote_payload`] - consumer input to the account cart's add body
//! - [`to_local_merchandise`] - consumer input to a guest cart snapshot
//! - [`entry_from_local`] / [`entry_from_remote`] - stored lines to the
//!   display shape shared by both backends

use storecart_core::{
    Album, EntryKey, ItemRef, ItemType, LineItem, LocalLine, Merchandise, Product, RemoteLine,
    VariantId,
};

use crate::remote::AddLinePayload;
use crate::view::CartEntry;

/// What a consumer can put in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartInput {
    /// A product, optionally with the selected variant.
    Product {
        product: Product,
        variant_id: Option<VariantId>,
    },
    /// An album.
    Album(Album),
    /// An already-shaped snapshot, e.g. re-adding a displayed guest line.
    Snapshot(Merchandise),
}

impl CartInput {
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        match self {
            Self::Product { .. } => ItemType::Product,
            Self::Album(_) => ItemType::Album,
            Self::Snapshot(merchandise) => merchandise.item_type(),
        }
    }
}

impl From<Product> for CartInput {
    fn from(product: Product) -> Self {
        Self::Product {
            product,
            variant_id: None,
        }
    }
}

impl From<Album> for CartInput {
    fn from(album: Album) -> Self {
        Self::Album(album)
    }
}

impl From<Merchandise> for CartInput {
    fn from(merchandise: Merchandise) -> Self {
        Self::Snapshot(merchandise)
    }
}

/// Build the account cart's add body.
///
/// Products send `product_id` and `variant_id` (explicit variant first, then
/// the one carried by the product, else `null`); albums send `album_id`.
#[must_use]
pub fn to_remote_payload(input: &CartInput, quantity: u32) -> AddLinePayload {
    let reference = match input {
        CartInput::Product {
            product,
            variant_id,
        } => ItemRef::Product {
            product_id: product.id,
            variant_id: variant_id.or(product.variant_id),
        },
        CartInput::Album(album) | CartInput::Snapshot(Merchandise::Album(album)) => {
            ItemRef::Album { album_id: album.id }
        }
        CartInput::Snapshot(Merchandise::Product(product)) => ItemRef::Product {
            product_id: product.id,
            variant_id: product.variant_id,
        },
    };

    AddLinePayload {
        reference,
        quantity,
    }
}

/// Build the guest cart's snapshot of the input.
#[must_use]
pub fn to_local_merchandise(input: &CartInput) -> Merchandise {
    match input {
        CartInput::Product {
            product,
            variant_id,
        } => Merchandise::Product(Product {
            variant_id: variant_id.or(product.variant_id),
            ..product.clone()
        }),
        CartInput::Album(album) => Merchandise::Album(album.clone()),
        CartInput::Snapshot(merchandise) => merchandise.clone(),
    }
}

/// Display entry for a guest cart line.
#[must_use]
pub fn entry_from_local(line: &LocalLine) -> CartEntry {
    CartEntry {
        key: EntryKey::Item(line.key()),
        item_type: line.merchandise.item_type(),
        title: line.merchandise.title().to_string(),
        image: line.merchandise.image().map(ToString::to_string),
        unit_price: line.unit_price(),
        quantity: line.quantity,
        line_total: line.line_total(),
    }
}

/// Display entry for an account cart line.
///
/// Lines the service returned without display fields get a placeholder
/// title naming the referenced item.
#[must_use]
pub fn entry_from_remote(line: &RemoteLine) -> CartEntry {
    let title = line.title().map_or_else(
        || match line.reference {
            ItemRef::Product { product_id, .. } => format!("Product #{product_id}"),
            ItemRef::Album { album_id } => format!("Album #{album_id}"),
        },
        ToString::to_string,
    );

    CartEntry {
        key: EntryKey::Line(line.id),
        item_type: line.reference.item_type(),
        title,
        image: line.image().map(ToString::to_string),
        unit_price: line.unit_price(),
        quantity: line.quantity,
        line_total: line.line_total(),
    }
}
