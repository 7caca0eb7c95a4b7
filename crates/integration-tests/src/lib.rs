//! Integration tests for storecart.
//!
//! Every test drives a real [`CartFacade`] the way a consumer would: the
//! guest cart is stored in a temporary directory and the cart service is a
//! `wiremock` server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storecart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `guest_cart` - Device-persisted cart, no session
//! - `account_cart` - Cart service round trips, cache invalidation, failures
//! - `session_switch` - Signing in and out between carts

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use storecart::{CartConfig, CartFacade, CartInput, CartView, SessionHandle};
use storecart_core::{Album, AlbumId, Product, ProductId, VariantId};
use tempfile::TempDir;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A cart service, a storage directory and a facade wired to both.
pub struct TestContext {
    pub server: MockServer,
    pub session: SessionHandle,
    pub storage: TempDir,
    pub facade: CartFacade,
}

impl TestContext {
    /// A context with no session.
    pub async fn guest() -> Self {
        Self::start(SessionHandle::guest(), None).await
    }

    /// A context signed in with `token`.
    pub async fn signed_in(token: &str) -> Self {
        Self::start(SessionHandle::authenticated(SecretString::from(token)), None).await
    }

    /// A guest context whose storage already holds `record`.
    pub async fn with_stored_cart(record: &str) -> Self {
        Self::start(SessionHandle::guest(), Some(record)).await
    }

    async fn start(session: SessionHandle, record: Option<&str>) -> Self {
        let server = MockServer::start().await;
        let storage = TempDir::new().expect("Failed to create storage dir");
        if let Some(record) = record {
            std::fs::write(storage.path().join("cart.json"), record)
                .expect("Failed to seed stored cart");
        }

        let facade = open_facade(&server.uri(), storage.path(), &session);
        Self {
            server,
            session,
            storage,
            facade,
        }
    }

    /// A fresh facade over the same storage and service, as after a restart.
    #[must_use]
    pub fn reopen(&self) -> CartFacade {
        open_facade(&self.server.uri(), self.storage.path(), &self.session)
    }

    /// Serve `body` for every `GET cart`.
    pub async fn serve_cart(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Serve `body` for the next `GET cart` only.
    pub async fn serve_cart_once(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;
    }
}

fn open_facade(server_uri: &str, storage: &Path, session: &SessionHandle) -> CartFacade {
    let api_url = format!("{server_uri}/api");
    let storage_dir = storage.display().to_string();
    let config = CartConfig::from_lookup(|key| match key {
        "STORECART_API_URL" => Some(api_url.clone()),
        "STORECART_STORAGE_DIR" => Some(storage_dir.clone()),
        _ => None,
    })
    .expect("Failed to build test config");

    CartFacade::new(&config, Arc::new(session.clone())).expect("Failed to build facade")
}

/// Wait until the published view is no longer loading.
pub async fn settled(receiver: &mut watch::Receiver<CartView>) -> CartView {
    tokio::time::timeout(
        Duration::from_secs(5),
        receiver.wait_for(|view| !view.is_loading),
    )
    .await
    .expect("Timed out waiting for cart to settle")
    .expect("Cart view channel closed")
    .clone()
}

// =============================================================================
// Fixtures
// =============================================================================

/// A product priced `price` whole units.
#[must_use]
pub fn product(id: i64, price: i64) -> CartInput {
    CartInput::from(Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        price: Decimal::new(price, 0),
        discount_price: None,
        image: Some(format!("https://cdn.test/products/{id}.jpg")),
        slug: Some(format!("product-{id}")),
        variant_id: None,
    })
}

/// A product with a selected variant.
#[must_use]
pub fn product_variant(id: i64, price: i64, variant: i64) -> CartInput {
    match product(id, price) {
        CartInput::Product { product, .. } => CartInput::Product {
            product,
            variant_id: Some(VariantId::new(variant)),
        },
        other => other,
    }
}

/// An album priced `price` whole units, optionally discounted.
#[must_use]
pub fn album(id: i64, price: i64, discount: Option<i64>) -> CartInput {
    CartInput::from(Album {
        id: AlbumId::new(id),
        title: format!("Album {id}"),
        artist: Some("Various Artists".to_string()),
        price: Decimal::new(price, 0),
        discount_price: discount.map(|d| Decimal::new(d, 0)),
        cover_image: None,
    })
}
