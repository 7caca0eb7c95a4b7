//! Account cart gateway.
//!
//! Uses `reqwest` against the cart service's REST endpoints and keeps the
//! fetched cart in a [`CartCache`]. Every successful mutation invalidates the
//! cache; nothing is patched locally, so the next read shows exactly what
//! the service holds.
//!
//! # Endpoints
//!
//! - `GET    {api}/cart`
//! - `POST   {api}/cart/items`
//! - `PATCH  {api}/cart/items/{id}`
//! - `DELETE {api}/cart/items/{id}`
//! - `POST   {api}/cart/clear`

mod cache;
mod types;

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use secrecy::ExposeSecret;
use storecart_core::{AccountCart, CartLineId, EntryKey};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::config::CartServiceConfig;
use crate::error::{GatewayError, extract_message};
use crate::session::AuthSession;

pub use cache::{CacheKey, CartCache};
pub use types::AddLinePayload;
use types::{CartBody, UpdateLinePayload};

/// User agent for cart service requests.
const USER_AGENT_VALUE: &str = concat!("storecart/", env!("CARGO_PKG_VERSION"));

/// Header carrying a per-mutation deduplication key.
const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

/// Number of body characters kept in error logs.
const LOGGED_BODY_CHARS: usize = 500;

// =============================================================================
// CartGateway
// =============================================================================

/// Client for the account cart.
///
/// Cheap to clone; clones share the HTTP client and the cache.
#[derive(Clone)]
pub struct CartGateway {
    inner: Arc<CartGatewayInner>,
}

struct CartGatewayInner {
    client: reqwest::Client,
    base_url: String,
    session: Arc<dyn AuthSession>,
    cache: CartCache,
}

impl CartGateway {
    /// Create a gateway for the configured service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: &CartServiceConfig,
        session: Arc<dyn AuthSession>,
    ) -> Result<Self, GatewayError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let mut builder = reqwest::Client::builder().default_headers(default_headers);
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(CartGatewayInner {
                client: builder.build()?,
                base_url: config.api_url.trim_end_matches('/').to_string(),
                session,
                cache: CartCache::new(config.cache_ttl),
            }),
        })
    }

    /// The account cart cache.
    #[must_use]
    pub fn cache(&self) -> &CartCache {
        &self.inner.cache
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    /// Send an authenticated request and check its status.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GatewayError> {
        let token = self
            .inner
            .session
            .access_token()
            .ok_or(GatewayError::Unauthenticated)?;

        let response = request.bearer_auth(token.expose_secret()).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body);
        if message.is_none() {
            error!(
                status = %status,
                body = %body.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
                "Cart service returned non-success status"
            );
        } else {
            warn!(status = %status, message = ?message, "Cart service rejected request");
        }

        Err(GatewayError::Rejected { status, message })
    }

    /// Send a mutation, then invalidate the cached cart.
    ///
    /// On failure the cache is left untouched.
    async fn mutate(&self, request: reqwest::RequestBuilder) -> Result<(), GatewayError> {
        let request = request.header(IDEMPOTENCY_KEY, Uuid::new_v4().to_string());
        self.send(request).await?;
        self.inner.cache.invalidate().await;
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch the account cart from the service, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<AccountCart, GatewayError> {
        let response = self.send(self.inner.client.get(self.url("cart"))).await?;
        let text = response.text().await?;

        let body: CartBody = serde_json::from_str(&text).map_err(|e| {
            error!(
                error = %e,
                body = %text.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
                "Failed to parse cart response"
            );
            GatewayError::Parse(e)
        })?;

        let cart = AccountCart::try_from(body).map_err(|e| {
            error!(error = %e, "Cart response out of range");
            GatewayError::Parse(e)
        })?;
        debug!(lines = cart.items.len(), total = %cart.total, "Fetched account cart");
        Ok(cart)
    }

    /// Read the account cart, fetching only when the cache entry is stale.
    ///
    /// # Errors
    ///
    /// Returns an error if a fetch was needed and failed. The cache is not
    /// modified in that case. Returns [`GatewayError::SessionChanged`] if
    /// the cache was reset while the fetch was in flight; the fetched cart
    /// is dropped.
    #[instrument(skip(self))]
    pub async fn read_cart(&self) -> Result<AccountCart, GatewayError> {
        if let Some(cart) = self.inner.cache.read().await {
            return Ok(cart);
        }

        let epoch = self.inner.cache.epoch();
        let cart = self.fetch_cart().await?;
        if !self.inner.cache.store(epoch, cart.clone()).await {
            return Err(GatewayError::SessionChanged);
        }
        Ok(cart)
    }

    /// Resolve a displayed entry key to a cart line id.
    ///
    /// Line keys pass through. Catalog keys are matched against the lines of
    /// the last known account cart, fetching it first if none is known.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::LineNotFound`] if no line references the item.
    pub async fn resolve_line(&self, key: EntryKey) -> Result<CartLineId, GatewayError> {
        let item_key = match key {
            EntryKey::Line(id) => return Ok(id),
            EntryKey::Item(item_key) => item_key,
        };

        let cart = match self.inner.cache.last_known() {
            Some(cart) => cart,
            None => self.read_cart().await?,
        };

        cart.items
            .iter()
            .find(|line| line.reference.item_key() == item_key)
            .map(|line| line.id)
            .ok_or(GatewayError::LineNotFound(key))
    }

    // =========================================================================
    // Mutations (never cached - invalidate on success)
    // =========================================================================

    /// Add a line to the account cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    #[instrument(skip(self), fields(item_type = %payload.reference.item_type()))]
    pub async fn add_line(&self, payload: &AddLinePayload) -> Result<(), GatewayError> {
        self.mutate(self.inner.client.post(self.url("cart/items")).json(payload))
            .await
    }

    /// Set the quantity of a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    #[instrument(skip(self), fields(line_id = %id))]
    pub async fn update_line(&self, id: CartLineId, quantity: u32) -> Result<(), GatewayError> {
        self.mutate(
            self.inner
                .client
                .patch(self.url(&format!("cart/items/{id}")))
                .json(&UpdateLinePayload { quantity }),
        )
        .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    #[instrument(skip(self), fields(line_id = %id))]
    pub async fn remove_line(&self, id: CartLineId) -> Result<(), GatewayError> {
        self.mutate(
            self.inner
                .client
                .delete(self.url(&format!("cart/items/{id}"))),
        )
        .await
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects it.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), GatewayError> {
        self.mutate(self.inner.client.post(self.url("cart/clear")))
            .await
    }
}

impl std::fmt::Debug for CartGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartGateway")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;
    use secrecy::SecretString;
    use serde_json::json;
    use storecart_core::{AlbumId, ItemKey, ItemRef, ProductId};
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::session::SessionHandle;

    fn gateway(server: &MockServer, session: SessionHandle) -> CartGateway {
        let config = CartServiceConfig::new(&format!("{}/api/", server.uri())).unwrap();
        CartGateway::new(&config, Arc::new(session)).unwrap()
    }

    fn signed_in() -> SessionHandle {
        SessionHandle::authenticated(SecretString::from("tok_123"))
    }

    fn cart_json() -> serde_json::Value {
        json!({
            "cart": {
                "items": [
                    {"id": 11, "item_type": "product", "product_id": 3, "variant_id": null,
                     "quantity": 2, "product": {"id": 3, "name": "Tee", "price": "20"}},
                    {"id": 12, "item_type": "album", "album_id": 3, "quantity": 1,
                     "album": {"id": 3, "title": "Giant Steps", "price": "15"}}
                ],
                "total": "55"
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .and(header("authorization", "Bearer tok_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_json()))
            .expect(1)
            .mount(&server)
            .await;

        let cart = gateway(&server, signed_in()).fetch_cart().await.unwrap();
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.total, Decimal::new(55, 0));
    }

    #[tokio::test]
    async fn test_read_uses_cache_until_invalidated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_json()))
            .expect(2)
            .mount(&server)
            .await;

        let gateway = gateway(&server, signed_in());
        gateway.read_cart().await.unwrap();
        gateway.read_cart().await.unwrap();

        gateway.cache().invalidate().await;
        gateway.read_cart().await.unwrap();
    }

    #[tokio::test]
    async fn test_successful_add_invalidates_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_json()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/cart/items"))
            .and(header_exists("idempotency-key"))
            .and(body_json(json!({
                "item_type": "album", "album_id": 9, "quantity": 1
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway(&server, signed_in());
        gateway.read_cart().await.unwrap();
        assert!(gateway.cache().read().await.is_some());

        gateway
            .add_line(&AddLinePayload {
                reference: ItemRef::Album {
                    album_id: AlbumId::new(9),
                },
                quantity: 1,
            })
            .await
            .unwrap();

        assert!(gateway.cache().read().await.is_none());
        assert!(gateway.cache().last_known().is_some());
    }

    #[tokio::test]
    async fn test_rejected_mutation_keeps_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_json()))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/cart/items/11"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"message": "Only 1 left in stock"})),
            )
            .mount(&server)
            .await;

        let gateway = gateway(&server, signed_in());
        let before = gateway.read_cart().await.unwrap();

        let err = gateway
            .update_line(CartLineId::new(11), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { .. }));
        assert_eq!(err.user_message().as_deref(), Some("Only 1 left in stock"));
        assert_eq!(gateway.cache().read().await, Some(before));
    }

    #[tokio::test]
    async fn test_remove_and_clear_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/cart/items/12"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/cart/clear"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway(&server, signed_in());
        gateway.remove_line(CartLineId::new(12)).await.unwrap();
        gateway.clear_cart().await.unwrap();
    }

    #[tokio::test]
    async fn test_requires_session() {
        let server = MockServer::start().await;
        let err = gateway(&server, SessionHandle::guest())
            .fetch_cart()
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_resolve_line_by_catalog_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_json()))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway(&server, signed_in());

        // Same numeric id, different item types.
        let product = EntryKey::Item(ItemKey::Product(ProductId::new(3)));
        let album = EntryKey::Item(ItemKey::Album(AlbumId::new(3)));
        assert_eq!(gateway.resolve_line(product).await.unwrap(), CartLineId::new(11));
        assert_eq!(gateway.resolve_line(album).await.unwrap(), CartLineId::new(12));

        let missing = EntryKey::Item(ItemKey::Album(AlbumId::new(4)));
        assert!(matches!(
            gateway.resolve_line(missing).await.unwrap_err(),
            GatewayError::LineNotFound(_)
        ));

        let line = EntryKey::Line(CartLineId::new(99));
        assert_eq!(gateway.resolve_line(line).await.unwrap(), CartLineId::new(99));
    }

    #[tokio::test]
    async fn test_malformed_cart_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": 1, "item_type": "album", "product_id": 3}]
            })))
            .mount(&server)
            .await;

        let gateway = gateway(&server, signed_in());
        let err = gateway.read_cart().await.unwrap_err();
        assert!(matches!(err, GatewayError::Parse(_)));
        assert!(gateway.cache().last_known().is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_cart_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"id": 1, "item_type": "album", "album_id": 3, "quantity": 2,
                     "price": "79228162514264337593543950335"}
                ]
            })))
            .mount(&server)
            .await;

        let gateway = gateway(&server, signed_in());
        let err = gateway.read_cart().await.unwrap_err();
        assert!(matches!(err, GatewayError::Parse(_)));
        assert!(gateway.cache().read().await.is_none());
        assert!(gateway.cache().last_known().is_none());
    }

    #[tokio::test]
    async fn test_fetch_overtaken_by_reset_is_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(cart_json())
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let gateway = gateway(&server, signed_in());
        let pending = tokio::spawn({
            let gateway = gateway.clone();
            async move { gateway.read_cart().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        gateway.cache().reset().await;

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, GatewayError::SessionChanged));
        assert!(gateway.cache().read().await.is_none());
        assert!(gateway.cache().last_known().is_none());
    }
}
