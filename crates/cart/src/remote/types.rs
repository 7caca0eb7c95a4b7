//! Wire types for the cart service.

use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use storecart_core::{AccountCart, ItemRef, RemoteLine};

/// Body of `POST cart/items`.
///
/// Serializes as `{item_type, product_id, variant_id, quantity}` for
/// products and `{item_type, album_id, quantity}` for albums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddLinePayload {
    #[serde(flatten)]
    pub reference: ItemRef,
    pub quantity: u32,
}

/// Body of `PATCH cart/items/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct UpdateLinePayload {
    pub quantity: u32,
}

/// Cart as sent by the service. `total` may be omitted.
#[derive(Debug, Deserialize)]
pub(crate) struct WireCart {
    items: Vec<RemoteLine>,
    #[serde(default)]
    total: Option<Decimal>,
}

/// `GET cart` answers either `{"cart": {...}}` or the cart itself.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CartBody {
    Wrapped { cart: WireCart },
    Bare(WireCart),
}

/// Rejects bodies whose line totals do not fit a `Decimal`, so every
/// accepted cart can be projected without overflowing.
impl TryFrom<CartBody> for AccountCart {
    type Error = serde_json::Error;

    fn try_from(body: CartBody) -> Result<Self, Self::Error> {
        let (CartBody::Wrapped { cart } | CartBody::Bare(cart)) = body;
        let computed = Self::try_from_items(cart.items)
            .ok_or_else(|| serde_json::Error::custom("cart line totals overflow"))?;
        Ok(match cart.total {
            Some(total) => Self {
                items: computed.items,
                total,
            },
            None => computed,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use storecart_core::{AlbumId, ProductId, VariantId};

    use super::*;

    #[test]
    fn test_album_payload_shape() {
        let payload = AddLinePayload {
            reference: ItemRef::Album {
                album_id: AlbumId::new(2),
            },
            quantity: 1,
        };
        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!({"item_type": "album", "album_id": 2, "quantity": 1})
        );
    }

    #[test]
    fn test_product_payload_shape() {
        let payload = AddLinePayload {
            reference: ItemRef::Product {
                product_id: ProductId::new(8),
                variant_id: Some(VariantId::new(81)),
            },
            quantity: 3,
        };
        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!({"item_type": "product", "product_id": 8, "variant_id": 81, "quantity": 3})
        );
    }

    #[test]
    fn test_wrapped_and_bare_bodies() {
        let line = json!({"id": 1, "item_type": "product", "product_id": 3, "quantity": 2, "price": "5"});

        let wrapped: CartBody =
            serde_json::from_value(json!({"cart": {"items": [line.clone()], "total": "10"}})).unwrap();
        let bare: CartBody =
            serde_json::from_value(json!({"items": [line], "total": "10"})).unwrap();

        let wrapped = AccountCart::try_from(wrapped).unwrap();
        let bare = AccountCart::try_from(bare).unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(wrapped.total, Decimal::new(10, 0));
    }

    #[test]
    fn test_missing_total_is_computed() {
        let body: CartBody = serde_json::from_value(json!({
            "items": [
                {"id": 1, "item_type": "album", "album_id": 3, "quantity": 2, "price": "7.50"}
            ]
        }))
        .unwrap();
        assert_eq!(AccountCart::try_from(body).unwrap().total, Decimal::new(15, 0));
    }

    #[test]
    fn test_server_total_passes_through() {
        let body: CartBody = serde_json::from_value(json!({
            "items": [{"id": 1, "item_type": "album", "album_id": 3, "price": "7.50"}],
            "total": "6.00"
        }))
        .unwrap();
        assert_eq!(AccountCart::try_from(body).unwrap().total, Decimal::new(600, 2));
    }

    #[test]
    fn test_overflowing_lines_are_rejected() {
        let body: CartBody = serde_json::from_value(json!({
            "items": [{
                "id": 1,
                "item_type": "album",
                "album_id": 3,
                "quantity": 2,
                "price": "79228162514264337593543950335"
            }],
            "total": "1"
        }))
        .unwrap();
        let err = AccountCart::try_from(body).unwrap_err();
        assert!(err.to_string().contains("overflow"));
    }
}
